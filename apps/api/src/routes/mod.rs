pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::matching::handlers as matching;
use crate::search::handlers as search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job search
        .route("/api/v1/jobs/search", get(search::handle_search))
        .route("/api/v1/jobs/nearby", get(search::handle_nearby))
        .route("/api/v1/geocode", post(search::handle_geocode))
        // Matching
        .route(
            "/api/v1/jobs/:id/candidates",
            get(matching::handle_job_candidates),
        )
        .route(
            "/api/v1/candidates/:user_id/suggested-jobs",
            get(matching::handle_suggested_jobs),
        )
        // Applications
        .route(
            "/api/v1/applications/board",
            get(applications::handle_board),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/locate",
            post(applications::handle_locate_applicant),
        )
        .with_state(state)
}
