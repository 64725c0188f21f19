//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub pending_jobs: Option<usize>,
    pub draft_seeding: bool,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let pending_jobs = match state.queue.stats().await {
        Ok(stats) => Some(stats.pending),
        Err(e) => {
            tracing::warn!(error = %e, "Job queue stats unavailable");
            None
        }
    };

    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        pending_jobs,
        draft_seeding: state.seeder.is_some(),
    };

    HttpResponse::Ok().json(response)
}
