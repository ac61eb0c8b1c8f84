use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::geo::Coordinate;

/// Raw `profiles` row. List columns are comma-separated text.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub skills: String,
    pub desired_positions: String,
    pub desired_companies: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// What the match scorer needs to know about a job seeker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub user_id: Uuid,
    pub skills: Vec<String>,
    pub desired_positions: Vec<String>,
    pub desired_companies: Vec<String>,
    pub location: String,
    pub coordinate: Option<Coordinate>,
}

impl From<ProfileRow> for CandidateProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.user_id,
            skills: split_list(&row.skills),
            desired_positions: split_list(&row.desired_positions),
            desired_companies: split_list(&row.desired_companies),
            location: row.location.trim().to_string(),
            coordinate: Coordinate::from_parts(row.latitude, row.longitude),
        }
    }
}

/// Splits a comma-separated column into trimmed, non-empty, de-duplicated items.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            items.push(item.to_string());
        }
    }
    items
}
