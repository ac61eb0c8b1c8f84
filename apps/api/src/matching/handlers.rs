//! Axum route handlers for candidate matching and job suggestions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scorer::{rank_candidates, suggest_jobs, CandidateMatch, JobMatch};
use crate::search::service::resolve_missing_coordinates;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn capped(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateMatchesResponse {
    pub job_id: Uuid,
    pub matches: Vec<CandidateMatch>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedJobsResponse {
    pub user_id: Uuid,
    pub suggestions: Vec<JobMatch>,
}

/// GET /api/v1/jobs/:id/candidates
///
/// Best-matching candidate profiles for a posting, score descending.
/// The posting's coordinate is resolved (and written back) first so the
/// location dimension can use distance bands.
pub async fn handle_job_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<CandidateMatchesResponse>, AppError> {
    let job = state
        .jobs
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut jobs = [job];
    resolve_missing_coordinates(state.jobs.as_ref(), &state.geocoder, &mut jobs).await;
    let [job] = jobs;

    let candidates = state.candidates.list_candidates().await?;
    let matches = rank_candidates(
        state.match_scorer.as_ref(),
        &job,
        &candidates,
        params.capped(),
    );

    Ok(Json(CandidateMatchesResponse { job_id, matches }))
}

/// GET /api/v1/candidates/:user_id/suggested-jobs
///
/// Postings ranked for one job seeker. Uses stored coordinates only.
pub async fn handle_suggested_jobs(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<SuggestedJobsResponse>, AppError> {
    let candidate = state
        .candidates
        .get_candidate(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))?;

    let jobs = state.jobs.list_jobs().await?;
    let suggestions = suggest_jobs(
        state.match_scorer.as_ref(),
        &candidate,
        jobs,
        params.capped(),
    );

    Ok(Json(SuggestedJobsResponse {
        user_id,
        suggestions,
    }))
}
