// Route exports
pub mod applications;
pub mod docs;
pub mod users;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::core::MatchEngine;
use crate::models::{ErrorResponse, HealthResponse};
use crate::services::{
    AnalysisPipeline, AnalyzerClient, CacheManager, ContentExtractor, JobStore, SupabaseClient,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
    pub analyzer: Arc<AnalyzerClient>,
    pub extractor: Arc<ContentExtractor>,
    pub cache: Arc<CacheManager>,
    pub jobs: Arc<JobStore>,
    pub pipeline: Arc<AnalysisPipeline>,
    pub engine: MatchEngine,
    pub jwt_secret: String,
}

/// Configure all routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .configure(docs::configure)
            .configure(applications::configure)
            .configure(users::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let jobs_healthy = state.jobs.health_check().await.unwrap_or(false);
    let analyzer_configured = state.analyzer.health_check().is_ok();

    let status = if jobs_healthy && analyzer_configured {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

pub(crate) fn bad_request(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: 400,
    })
}

pub(crate) fn forbidden(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Forbidden().json(ErrorResponse {
        error: "forbidden".to_string(),
        message: message.into(),
        status_code: 403,
    })
}

pub(crate) fn not_found(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "not_found".to_string(),
        message: message.into(),
        status_code: 404,
    })
}

pub(crate) fn internal_error(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: 500,
    })
}
