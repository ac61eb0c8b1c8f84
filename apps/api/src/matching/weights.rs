use serde::{Deserialize, Serialize};

/// Points per dimension when every dimension is evaluable. Defaults sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub skills: f64,
    pub position: f64,
    pub company: f64,
    pub location: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: 40.0,
            position: 25.0,
            company: 15.0,
            location: 20.0,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.position + self.company + self.location
    }

    pub fn is_valid(&self) -> bool {
        [self.skills, self.position, self.company, self.location]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Share of the location weight earned within `max_miles`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub max_miles: f64,
    pub fraction: f64,
}

/// Proximity bands, nearest first. Anything beyond the last band earns nothing.
pub const DEFAULT_DISTANCE_BANDS: [DistanceBand; 3] = [
    DistanceBand {
        max_miles: 50.0,
        fraction: 1.0,
    },
    DistanceBand {
        max_miles: 100.0,
        fraction: 0.5,
    },
    DistanceBand {
        max_miles: 200.0,
        fraction: 0.25,
    },
];

/// Share of the location weight earned by a free-text location match when
/// coordinates are missing on either side.
pub const TEXT_LOCATION_FRACTION: f64 = 0.7;
