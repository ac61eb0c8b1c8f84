use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::geo::Coordinate;

/// A job posting as stored in `jobs`. Coordinates are filled lazily by the geocoder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub posted_at: DateTime<Utc>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub owner_id: Option<Uuid>,
}

impl JobPosting {
    /// The stored coordinate. Once present it is authoritative.
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = Some(coordinate.lat);
        self.longitude = Some(coordinate.lon);
    }
}
