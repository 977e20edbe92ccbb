use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::auth::MaybeAuthUser;
use crate::models::{
    AnalyzeMatchRequest, ApplicationReceipt, StatusQuery, SubmitApplicationRequest,
    SubmitApplicationResponse,
};
use crate::routes::{bad_request, internal_error, not_found, AppState};

/// Configure application routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/applications")
            .route("/{slug}/apply", web::post().to(submit_application))
            .route("/status/{application_id}", web::get().to(get_status))
            .route("/analyze-match", web::post().to(analyze_match)),
    );
}

/// Submit an application to a date-me-doc
///
/// POST /api/applications/{slug}/apply
async fn submit_application(
    state: web::Data<AppState>,
    auth: MaybeAuthUser,
    path: web::Path<String>,
    req: web::Json<SubmitApplicationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let slug = path.into_inner();

    let doc = match state.supabase.get_doc_by_slug(&slug).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return not_found("Date-me-doc not found"),
        Err(e) => {
            tracing::error!("Failed to fetch doc {}: {}", slug, e);
            return internal_error("doc_fetch_failed", e.to_string());
        }
    };

    if !doc.is_active {
        return bad_request(
            "doc_inactive",
            "This date-me-doc is no longer accepting applications",
        );
    }

    // Every required question must have a non-empty answer
    for question in doc.form_questions.iter().filter(|q| q.required) {
        let answered = req
            .answers
            .get(&question.id)
            .map(|answer| !answer.is_null() && answer.as_str() != Some(""))
            .unwrap_or(false);
        if !answered {
            return bad_request(
                "missing_answer",
                format!("Missing required answer for question: {}", question.question),
            );
        }
    }

    // Attach the applicant's profile when authenticated
    let applicant_user_id = match &auth.0 {
        Some(user) => match state.supabase.get_profile_by_auth_id(&user.id).await {
            Ok(profile) => profile.map(|p| p.id),
            Err(e) => {
                tracing::warn!("Failed to fetch applicant profile for {}: {}", user.id, e);
                None
            }
        },
        None => None,
    };

    let payload = serde_json::json!({
        "date_me_doc_id": doc.id,
        "applicant_user_id": applicant_user_id,
        "applicant_email": req.applicant_email,
        "applicant_name": req.applicant_name,
        "answers": req.answers,
        "social_links": req.submitted_links,
        "status": "pending",
    });

    let application = match state.supabase.insert_application(&payload).await {
        Ok(application) => application,
        Err(e) => {
            tracing::error!("Failed to create application for {}: {}", slug, e);
            return internal_error("application_create_failed", e.to_string());
        }
    };

    if let Err(e) = state
        .supabase
        .update_doc(
            doc.id,
            &serde_json::json!({ "application_count": doc.application_count + 1 }),
        )
        .await
    {
        tracing::warn!("Failed to bump application count for {}: {}", doc.id, e);
    }

    if let Err(e) = state
        .jobs
        .enqueue("content_extraction", application.id, "application", 5)
        .await
    {
        tracing::warn!("Failed to enqueue analysis job for {}: {}", application.id, e);
    }

    // Run the analysis without holding the response
    let pipeline = state.pipeline.clone();
    let application_id = application.id;
    let doc_id = doc.id;
    tokio::spawn(async move {
        pipeline.process_application(application_id, doc_id).await;
    });

    tracing::info!("Application {} submitted to doc {}", application.id, doc.id);

    HttpResponse::Created().json(SubmitApplicationResponse {
        message: "Application submitted successfully".to_string(),
        application: ApplicationReceipt {
            id: application.id,
            status: application.status,
            submitted_at: application.created_at,
        },
    })
}

/// Get application status and results (applicant view)
///
/// GET /api/applications/status/{application_id}?email=
///
/// Unauthenticated callers must supply the email the application was
/// submitted with; authenticated callers must own the application.
async fn get_status(
    state: web::Data<AppState>,
    auth: MaybeAuthUser,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> impl Responder {
    let application_id = path.into_inner();

    let application = match state.supabase.get_application(application_id).await {
        Ok(Some(application)) => application,
        Ok(None) => return not_found("Application not found"),
        Err(e) => {
            tracing::error!("Failed to fetch application {}: {}", application_id, e);
            return internal_error("application_fetch_failed", e.to_string());
        }
    };

    match (&auth.0, &query.email) {
        (Some(user), _) => {
            let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
                    return internal_error("profile_fetch_failed", e.to_string());
                }
            };
            let owns = profile
                .map(|p| application.applicant_user_id == Some(p.id))
                .unwrap_or(false);
            if !owns {
                return not_found("Application not found");
            }
        }
        (None, Some(email)) => {
            if !application.applicant_email.eq_ignore_ascii_case(email) {
                return not_found("Application not found");
            }
        }
        (None, None) => {
            return bad_request(
                "email_required",
                "Email required for unauthenticated access",
            );
        }
    }

    let score = match state.supabase.get_score_for_application(application_id).await {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!("Failed to fetch score for {}: {}", application_id, e);
            None
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "application": {
            "id": application.id,
            "status": application.status,
            "match_score": application.match_score,
            "analysis_completed": application.analysis_completed,
            "created_at": application.created_at,
            "matchmaking_score": score.map(|s| serde_json::json!({
                "overall_score": s.overall_score,
                "recommendation": s.recommendation,
                "compatibility_breakdown": s.compatibility_breakdown,
            })),
        }
    }))
}

/// Ad-hoc compatibility analysis between two supplied profiles
///
/// POST /api/applications/analyze-match
async fn analyze_match(
    state: web::Data<AppState>,
    req: web::Json<AnalyzeMatchRequest>,
) -> impl Responder {
    if req.doc_owner_profile.is_null() || req.applicant_profile.is_null() {
        return bad_request(
            "missing_profiles",
            "Both owner and applicant profiles are required",
        );
    }

    let preferences = req
        .doc_preferences
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));

    let compatibility = match state
        .analyzer
        .calculate_compatibility(&req.doc_owner_profile, &req.applicant_profile, &preferences)
        .await
    {
        Ok(analysis) => analysis.result,
        Err(e) => {
            tracing::error!("Compatibility analysis failed: {}", e);
            return internal_error("analysis_failed", e.to_string());
        }
    };

    let answer_analysis = match &req.application_answers {
        Some(answers) if !answers.is_null() => {
            match state
                .analyzer
                .analyze_application_match(
                    &preferences,
                    &req.doc_owner_profile,
                    answers,
                    &req.applicant_profile,
                )
                .await
            {
                Ok(analysis) => Some(analysis.result),
                Err(e) => {
                    tracing::warn!("Application answer analysis failed: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    HttpResponse::Ok().json(serde_json::json!({
        "analysis": {
            "compatibility_score": compatibility.overall_compatibility_score,
            "compatibility_breakdown": compatibility.compatibility_breakdown,
            "recommendation": compatibility.recommendation,
            "answer_analysis": answer_analysis,
        }
    }))
}
