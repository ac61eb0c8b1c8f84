//! Axum route handlers for application status changes and the status board.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::applications::locate::resolve_applicant_coordinate;
use crate::applications::status::{group_by_status, transition, StatusBoard};
use crate::errors::AppError;
use crate::geo::Coordinate;
use crate::models::application::ApplicationRow;
use crate::state::AppState;
use crate::store::ApplicationStore;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct LocateResponse {
    pub application_id: Uuid,
    pub coordinate: Option<Coordinate>,
}

/// Validates and applies a status change. Unknown targets fail with
/// `InvalidStatus` before anything is written.
pub async fn change_status(
    store: &dyn ApplicationStore,
    id: Uuid,
    target: &str,
) -> Result<ApplicationRow, AppError> {
    let mut application = store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let next = transition(&mut application, target)?;
    store.update_status(id, next.as_str()).await?;
    Ok(application)
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = change_status(state.applications.as_ref(), id, &request.status).await?;
    Ok(Json(application))
}

/// GET /api/v1/applications/board
///
/// Applications grouped by status, optionally for a single job.
pub async fn handle_board(
    State(state): State<AppState>,
    Query(params): Query<BoardQuery>,
) -> Result<Json<StatusBoard>, AppError> {
    let applications = state.applications.list_applications(params.job_id).await?;
    let board = group_by_status(applications);
    debug!(
        "Status board: {} applications, {} with unrecognized status",
        board.total(),
        board.unexpected.len()
    );
    Ok(Json(board))
}

/// POST /api/v1/applications/:id/locate
///
/// Geocodes the applicant's free-text location when no coordinate is stored.
pub async fn handle_locate_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LocateResponse>, AppError> {
    let mut application = state
        .applications
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let coordinate =
        resolve_applicant_coordinate(state.applications.as_ref(), &state.geocoder, &mut application)
            .await;

    Ok(Json(LocateResponse {
        application_id: id,
        coordinate,
    }))
}
