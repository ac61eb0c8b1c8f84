use std::sync::Arc;

use crate::geo::Geocoder;
use crate::matching::scorer::MatchScorer;
use crate::store::{ApplicationStore, CandidateStore, JobStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub candidates: Arc<dyn CandidateStore>,
    pub applications: Arc<dyn ApplicationStore>,
    /// Cache-backed, single-flight geocoder shared by search, matching and applications.
    pub geocoder: Arc<Geocoder>,
    /// Pluggable match scorer. Default: WeightedMatchScorer with configured weights.
    pub match_scorer: Arc<dyn MatchScorer>,
}
