use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::models::{
    ApplicationListQuery, ApplicationListResponse, ApplicationStatus, ApplicationWithScore,
    CreateDocRequest, DateMeDoc, DocListResponse, DocResponse, PublicDocResponse,
    UpdateApplicationStatusRequest, UpdateDocRequest, UserProfile,
};
use crate::routes::{bad_request, forbidden, internal_error, not_found, AppState};
use crate::services::CacheKey;

/// Configure date-me-doc routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/docs")
            .route("", web::post().to(create_doc))
            .route("", web::get().to(list_my_docs))
            .route("/{slug}", web::get().to(get_doc_by_slug))
            .route("/{id}", web::put().to(update_doc))
            .route("/{id}", web::delete().to(delete_doc))
            .route("/{id}/applications", web::get().to(list_doc_applications))
            .route(
                "/{id}/applications/{application_id}/status",
                web::patch().to(update_application_status),
            ),
    );
}

/// Fetch the caller's profile, creating a bare one on first touch
async fn get_or_create_profile(
    state: &AppState,
    user: &AuthUser,
) -> Result<UserProfile, HttpResponse> {
    match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => state
            .supabase
            .insert_profile(&serde_json::json!({
                "auth_user_id": user.id,
                "email": user.email.clone().unwrap_or_default(),
            }))
            .await
            .map_err(|e| {
                tracing::error!("Failed to create profile for {}: {}", user.id, e);
                internal_error("profile_create_failed", e.to_string())
            }),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            Err(internal_error("profile_fetch_failed", e.to_string()))
        }
    }
}

/// Verify the caller owns the doc; returns the doc on success
async fn require_doc_owner(
    state: &AppState,
    user: &AuthUser,
    doc_id: Uuid,
    action: &str,
) -> Result<DateMeDoc, HttpResponse> {
    let doc = match state.supabase.get_doc(doc_id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return Err(not_found("Date-me-doc not found")),
        Err(e) => {
            tracing::error!("Failed to fetch doc {}: {}", doc_id, e);
            return Err(internal_error("doc_fetch_failed", e.to_string()));
        }
    };

    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return Err(forbidden(format!("Not authorized to {} this date-me-doc", action)))
        }
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return Err(internal_error("profile_fetch_failed", e.to_string()));
        }
    };

    if doc.user_id != profile.id {
        return Err(forbidden(format!("Not authorized to {} this date-me-doc", action)));
    }

    Ok(doc)
}

/// Create a new date-me-doc
///
/// POST /api/docs
async fn create_doc(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<CreateDocRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let slug = req.resolved_slug();

    match state.supabase.is_slug_taken(&slug).await {
        Ok(true) => {
            return bad_request("slug_taken", "Slug already taken. Please choose another.")
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Slug check failed for {}: {}", slug, e);
            return internal_error("slug_check_failed", e.to_string());
        }
    }

    let profile = match get_or_create_profile(&state, &user).await {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    let description = req
        .description
        .clone()
        .or_else(|| req.about_me.clone())
        .unwrap_or_default();
    let about_me = req
        .about_me
        .clone()
        .or_else(|| req.description.clone())
        .unwrap_or_default();

    let payload = serde_json::json!({
        "user_id": profile.id,
        "title": req.title,
        "description": description,
        "header_content": req.header_content.clone().unwrap_or_else(|| serde_json::json!({})),
        "slug": slug,
        "preferences": req.preferences.clone().unwrap_or_else(|| serde_json::json!({})),
        "form_questions": req.form_questions.clone().unwrap_or_default(),
        "is_public": req.is_public.unwrap_or(true),
        "settings": req.settings.clone().unwrap_or_else(|| serde_json::json!({})),
        "about_me": about_me,
        "interests": req.interests.clone().unwrap_or_default(),
        "deal_breakers": req.deal_breakers.clone().unwrap_or_default(),
        "social_links": req.social_links.clone().unwrap_or_else(|| serde_json::json!({})),
    });

    match state.supabase.insert_doc(&payload).await {
        Ok(doc) => {
            tracing::info!("Created doc {} ({})", doc.id, doc.slug);
            HttpResponse::Created().json(DocResponse {
                message: "Date-me-doc created successfully".to_string(),
                doc,
            })
        }
        Err(e) => {
            tracing::error!("Failed to create doc: {}", e);
            internal_error("doc_create_failed", e.to_string())
        }
    }
}

/// Get all date-me-docs for the authenticated user
///
/// GET /api/docs
async fn list_my_docs(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    let profile = match state.supabase.get_profile_by_auth_id(&user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return HttpResponse::Ok().json(DocListResponse { docs: vec![] }),
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user.id, e);
            return internal_error("profile_fetch_failed", e.to_string());
        }
    };

    match state.supabase.list_docs_for_user(profile.id).await {
        Ok(docs) => HttpResponse::Ok().json(DocListResponse { docs }),
        Err(e) => {
            tracing::error!("Failed to list docs for {}: {}", profile.id, e);
            internal_error("doc_list_failed", e.to_string())
        }
    }
}

/// Get a date-me-doc by slug (public access)
///
/// GET /api/docs/{slug}
async fn get_doc_by_slug(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let slug = path.into_inner();
    let cache_key = CacheKey::doc_slug(&slug);

    let doc: DateMeDoc = match state.cache.get(&cache_key).await {
        Ok(doc) => doc,
        Err(_) => {
            let doc = match state.supabase.get_doc_by_slug(&slug).await {
                Ok(Some(doc)) => doc,
                Ok(None) => return not_found("Date-me-doc not found"),
                Err(e) => {
                    tracing::error!("Failed to fetch doc {}: {}", slug, e);
                    return internal_error("doc_fetch_failed", e.to_string());
                }
            };

            if let Err(e) = state.cache.set(&cache_key, &doc).await {
                tracing::warn!("Failed to cache doc {}: {}", slug, e);
            }
            doc
        }
    };

    if !doc.is_active {
        return forbidden("This date-me-doc is no longer active");
    }

    // Read-then-update increment; the row API has no atomic counter
    if let Err(e) = state
        .supabase
        .update_doc(doc.id, &serde_json::json!({ "view_count": doc.view_count + 1 }))
        .await
    {
        tracing::warn!("Failed to bump view count for {}: {}", doc.id, e);
    }

    // Strip the owner id from the public view
    let mut public = serde_json::to_value(&doc).unwrap_or(Value::Null);
    if let Some(obj) = public.as_object_mut() {
        obj.remove("user_id");
    }

    HttpResponse::Ok().json(PublicDocResponse { doc: public })
}

/// Update a date-me-doc (owner only)
///
/// PUT /api/docs/{id}
async fn update_doc(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateDocRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_failed", errors.to_string());
    }

    let doc_id = path.into_inner();
    let doc = match require_doc_owner(&state, &user, doc_id, "update").await {
        Ok(doc) => doc,
        Err(resp) => return resp,
    };

    match state.supabase.update_doc(doc_id, &req.to_patch()).await {
        Ok(updated) => {
            if let Err(e) = state.cache.delete(&CacheKey::doc_slug(&doc.slug)).await {
                tracing::warn!("Failed to invalidate cache for {}: {}", doc.slug, e);
            }
            HttpResponse::Ok().json(DocResponse {
                message: "Date-me-doc updated successfully".to_string(),
                doc: updated,
            })
        }
        Err(e) => {
            tracing::error!("Failed to update doc {}: {}", doc_id, e);
            internal_error("doc_update_failed", e.to_string())
        }
    }
}

/// Delete a date-me-doc (owner only)
///
/// DELETE /api/docs/{id}
async fn delete_doc(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> impl Responder {
    let doc_id = path.into_inner();
    let doc = match require_doc_owner(&state, &user, doc_id, "delete").await {
        Ok(doc) => doc,
        Err(resp) => return resp,
    };

    match state.supabase.delete_doc(doc_id).await {
        Ok(()) => {
            if let Err(e) = state.cache.delete(&CacheKey::doc_slug(&doc.slug)).await {
                tracing::warn!("Failed to invalidate cache for {}: {}", doc.slug, e);
            }
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Date-me-doc deleted successfully"
            }))
        }
        Err(e) => {
            tracing::error!("Failed to delete doc {}: {}", doc_id, e);
            internal_error("doc_delete_failed", e.to_string())
        }
    }
}

/// Get applications for a date-me-doc (owner only)
///
/// GET /api/docs/{id}/applications?status=&limit=&offset=
async fn list_doc_applications(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<ApplicationListQuery>,
) -> impl Responder {
    let doc_id = path.into_inner();
    if let Err(resp) = require_doc_owner(&state, &user, doc_id, "view applications for").await {
        return resp;
    }

    if let Some(status) = &query.status {
        if ApplicationStatus::parse(status).is_none() {
            return bad_request("invalid_status", "Invalid status filter");
        }
    }

    let applications = match state
        .supabase
        .list_applications_for_doc(
            doc_id,
            query.status.as_deref(),
            query.limit.min(100),
            query.offset,
        )
        .await
    {
        Ok(applications) => applications,
        Err(e) => {
            tracing::error!("Failed to list applications for {}: {}", doc_id, e);
            return internal_error("application_list_failed", e.to_string());
        }
    };

    // Join stored scores onto the listing
    let ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();
    let scores = match state.supabase.scores_for_applications(&ids).await {
        Ok(scores) => scores,
        Err(e) => {
            tracing::warn!("Failed to fetch scores for doc {}: {}", doc_id, e);
            vec![]
        }
    };

    let with_scores: Vec<ApplicationWithScore> = applications
        .into_iter()
        .map(|application| {
            let score = scores.iter().find(|s| s.application_id == application.id);
            ApplicationWithScore {
                overall_score: score.map(|s| s.overall_score),
                compatibility_breakdown: score.map(|s| s.compatibility_breakdown.clone()),
                recommendation: score.and_then(|s| s.recommendation),
                application,
            }
        })
        .collect();

    let total = with_scores.len();
    HttpResponse::Ok().json(ApplicationListResponse {
        applications: with_scores,
        total,
    })
}

/// Update an application's status (owner only)
///
/// PATCH /api/docs/{id}/applications/{application_id}/status
async fn update_application_status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateApplicationStatusRequest>,
) -> impl Responder {
    let (doc_id, application_id) = path.into_inner();

    let Some(status) = ApplicationStatus::parse(&req.status) else {
        return bad_request("invalid_status", "Invalid status");
    };

    if let Err(resp) = require_doc_owner(&state, &user, doc_id, "manage").await {
        return resp;
    }

    match state
        .supabase
        .update_application_status(application_id, doc_id, status.as_str())
        .await
    {
        Ok(application) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Application status updated",
            "application": application,
        })),
        Err(crate::services::SupabaseError::NotFound(_)) => not_found("Application not found"),
        Err(e) => {
            tracing::error!("Failed to update status for {}: {}", application_id, e);
            internal_error("status_update_failed", e.to_string())
        }
    }
}
