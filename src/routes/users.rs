use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::core::MatchInput;
use crate::models::{
    CandidateSummary, CreateProfileRequest, FindMatchesRequest, FindMatchesResponse,
    FootprintAnalysisResponse, MatchApplicationRequest, MatchApplicationResponse, ProfileResponse,
    RankedCandidate, UpdateProfileRequest,
};
use crate::routes::{bad_request, internal_error, not_found, AppState};
use crate::services::PipelineError;

/// Configure user routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/profile", web::post().to(create_profile))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/analyze", web::post().to(analyze_footprint))
            .route("/analysis", web::get().to(get_analysis))
            .route("/matches", web::post().to(find_matches))
            .route("/match-application", web::post().to(match_application)),
    );
}

/// Create a user profile (onboarding)
///
/// POST /api/users/profile
async fn create_profile(
    state: web::Data<AppState>,
    auth: MaybeAuthUser,
    req: web::Json<CreateProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let Some(auth_user_id) = auth
        .0
        .as_ref()
        .map(|u| u.id.clone())
        .or_else(|| req.auth_user_id.clone())
    else {
        return bad_request("missing_auth_user_id", "auth_user_id is required");
    };

    match state.supabase.get_profile_by_auth_id(&auth_user_id).await {
        Ok(Some(_)) => return bad_request("profile_exists", "Profile already exists"),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to check profile for {}: {}", auth_user_id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    }

    let email = auth
        .0
        .as_ref()
        .and_then(|u| u.email.clone())
        .or_else(|| req.email.clone());

    let payload = serde_json::json!({
        "auth_user_id": auth_user_id,
        "email": email.unwrap_or_default(),
        "name": req.name,
        "age": req.age,
        "location": req.location,
        "gender": req.gender,
        "looking_for": req.looking_for.clone().unwrap_or_default(),
        "bio": req.bio,
        "interests": req.interests.clone().unwrap_or_default(),
        "hobbies": req.hobbies.clone().unwrap_or_default(),
        "values": req.values.clone().unwrap_or_default(),
        "lifestyle": req.lifestyle.clone().unwrap_or_else(|| serde_json::json!({})),
        "preferences": req.preferences.clone().unwrap_or_else(|| serde_json::json!({})),
        "profile_completed": true,
    });

    match state.supabase.insert_profile(&payload).await {
        Ok(profile) => {
            tracing::info!("Created profile {} for {}", profile.id, auth_user_id);
            HttpResponse::Created().json(serde_json::json!({
                "message": "Profile created successfully",
                "profile": profile,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to create profile for {}: {}", auth_user_id, e);
            internal_error("profile_create_failed", e.to_string())
        }
    }
}

/// Get the current user's profile, creating a bare one on first access
///
/// GET /api/users/profile
async fn get_profile(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => HttpResponse::Ok().json(ProfileResponse { profile }),
        Ok(None) => {
            let payload = serde_json::json!({
                "auth_user_id": user.id,
                "email": user.email.clone().unwrap_or_default(),
            });
            match state.supabase.insert_profile(&payload).await {
                Ok(profile) => HttpResponse::Ok().json(ProfileResponse { profile }),
                Err(e) => {
                    tracing::error!("Failed to create profile for {}: {}", user.id, e);
                    internal_error("profile_create_failed", e.to_string())
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            internal_error("profile_fetch_failed", e.to_string())
        }
    }
}

/// Update the current user's profile
///
/// PUT /api/users/profile
async fn update_profile(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return not_found("Profile not found"),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    };

    match state.supabase.update_profile(profile.id, &req.to_patch()).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Profile updated successfully",
            "profile": updated,
        })),
        Err(e) => {
            tracing::error!("Failed to update profile {}: {}", profile.id, e);
            internal_error("profile_update_failed", e.to_string())
        }
    }
}

/// Analyze the user's digital footprint
///
/// POST /api/users/analyze
async fn analyze_footprint(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return not_found("Profile not found"),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    };

    match state.pipeline.analyze_footprint(&profile).await {
        Ok(analysis) => HttpResponse::Ok().json(FootprintAnalysisResponse {
            message: "Analysis completed successfully".to_string(),
            analysis: serde_json::to_value(&analysis.profile).unwrap_or_default(),
            metadata: analysis.metadata,
            footprint_score: analysis.footprint_score,
        }),
        Err(PipelineError::Precondition(message)) => bad_request("no_links", message),
        Err(e) => {
            tracing::error!("Footprint analysis failed for {}: {}", profile.id, e);
            internal_error("analysis_failed", e.to_string())
        }
    }
}

/// Get the user's stored psychological analyses
///
/// GET /api/users/analysis
async fn get_analysis(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return not_found("Profile not found"),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    };

    match state.supabase.list_analyses_for_user(profile.id).await {
        Ok(analyses) => HttpResponse::Ok().json(serde_json::json!({ "analyses": analyses })),
        Err(e) => {
            tracing::error!("Failed to list analyses for {}: {}", profile.id, e);
            internal_error("analysis_list_failed", e.to_string())
        }
    }
}

/// Find matches for the authenticated user
///
/// POST /api/users/matches
async fn find_matches(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return not_found("Profile not found"),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    };

    // Over-fetch so filtering and ranking still fill the page
    let candidates = match state
        .supabase
        .list_candidate_profiles(profile.id, req.limit * 3)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to list candidates for {}: {}", profile.id, e);
            return internal_error("candidate_list_failed", e.to_string());
        }
    };

    let result = state.engine.rank_candidates(&profile, candidates, req.limit);

    let mut matches = Vec::with_capacity(result.ranked.len());
    for ranked in &result.ranked {
        // URL-context rescoring only for the page that will be returned
        let outcome = if req.include_url_matching {
            let links = ranked.profile.social_link_list();
            let url_score = state.pipeline.url_context_score(&profile, &links).await;
            state.engine.match_profiles(
                &MatchInput::from(&profile),
                &MatchInput::from(&ranked.profile),
                url_score,
            )
        } else {
            state.engine.match_profiles(
                &MatchInput::from(&profile),
                &MatchInput::from(&ranked.profile),
                None,
            )
        };

        let match_score = if req.include_url_matching {
            outcome.overall_score
        } else {
            // Rank-adjusted score, including candidate bonuses and penalties
            ranked.score
        };

        matches.push(RankedCandidate {
            profile: CandidateSummary::from(&ranked.profile),
            match_score,
            breakdown: outcome.breakdown,
            recommendation: crate::models::Recommendation::from_score(match_score),
        });
    }

    // Rescoring can reorder the page
    matches.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tracing::info!(
        "Returning {} matches for {} (from {} candidates)",
        matches.len(),
        profile.id,
        result.total_candidates
    );

    HttpResponse::Ok().json(FindMatchesResponse {
        matches,
        total_checked: result.total_candidates,
        matching_criteria: if req.include_url_matching {
            "text + url context".to_string()
        } else {
            "text only".to_string()
        },
    })
}

/// Match an application against the date-me-doc owner
///
/// POST /api/users/match-application
async fn match_application(
    state: web::Data<AppState>,
    _user: AuthUser,
    req: web::Json<MatchApplicationRequest>,
) -> impl Responder {
    match state
        .pipeline
        .match_application(req.application_id, req.include_url_matching)
        .await
    {
        Ok((outcome, score_id)) => HttpResponse::Ok().json(MatchApplicationResponse {
            match_result: serde_json::to_value(&outcome).unwrap_or_default(),
            match_score_id: score_id,
        }),
        Err(PipelineError::Missing(what)) => not_found(format!("{} not found", what)),
        Err(PipelineError::Precondition(message)) => bad_request("incomplete_profile", message),
        Err(e) => {
            tracing::error!("Match application failed for {}: {}", req.application_id, e);
            internal_error("match_failed", e.to_string())
        }
    }
}
