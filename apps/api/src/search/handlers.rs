//! Axum route handlers for job search and the map feed.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::geo::Coordinate;
use crate::search::query::{parse_radius, SearchParams, SearchRequest};
use crate::search::ranker::{nearby, NearbyJob, SearchHit, DEFAULT_NEARBY_RADIUS_MILES};
use crate::search::service::search_jobs;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub radius_miles: Option<f64>,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub radius: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub jobs: Vec<NearbyJob>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub address: String,
    pub coordinate: Coordinate,
}

/// GET /api/v1/jobs/search
///
/// Without `radius`: title/company match, newest first.
/// With `radius`: center from `lat`/`lon` or geocoded `location`, nearest first.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let request = SearchRequest::from(params);
    let results = search_jobs(state.jobs.as_ref(), &state.geocoder, &request).await?;

    Ok(Json(SearchResponse {
        count: results.len(),
        radius_miles: request.radius,
        results,
    }))
}

/// GET /api/v1/jobs/nearby
///
/// Map feed over postings that already carry coordinates.
pub async fn handle_nearby(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResponse>, AppError> {
    let center = match (params.lat.as_deref(), params.lon.as_deref()) {
        (Some(lat), Some(lon)) => Coordinate::parse(lat, lon),
        _ => None,
    }
    .ok_or_else(|| AppError::Validation("lat and lon required".to_string()))?;

    let radius = parse_radius(params.radius.as_deref()).unwrap_or(DEFAULT_NEARBY_RADIUS_MILES);
    let query = params.q.unwrap_or_default();

    let jobs = state.jobs.list_jobs().await?;
    Ok(Json(NearbyResponse {
        jobs: nearby(&jobs, center, radius, &query),
    }))
}

/// POST /api/v1/geocode
///
/// Resolves an address for client-side map centering.
pub async fn handle_geocode(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<GeocodeResponse>, AppError> {
    let address = request.address.trim();
    if address.is_empty() {
        return Err(AppError::Validation("address cannot be empty".to_string()));
    }

    let coordinate = state
        .geocoder
        .resolve(address)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Could not locate '{address}'")))?;

    Ok(Json(GeocodeResponse {
        address: address.to_string(),
        coordinate,
    }))
}
