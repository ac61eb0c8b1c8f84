use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::geo::Coordinate;

/// An `applications` row. `status` is kept as stored text so rows carrying a
/// value outside the known set can still be loaded and displayed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub applicant_location: String,
    pub applicant_latitude: Option<f64>,
    pub applicant_longitude: Option<f64>,
}

impl ApplicationRow {
    pub fn applicant_coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.applicant_latitude, self.applicant_longitude)
    }
}
