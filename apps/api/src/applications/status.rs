//! Application status machine.
//!
//! Any known status may move to any other known status; only membership in
//! the set is validated. `Applied` is the only initial state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::application::ApplicationRow;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid status '{0}'")]
    InvalidStatus(String),
}

/// Canonical status set, declared in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Review,
    Interview,
    Offer,
    Closed,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Review,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Review => "review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Closed => "closed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Review => "In Review",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusError::InvalidStatus(s.to_string()))
    }
}

/// Validates `target` and, only if valid, assigns it to the application.
/// On error the row is left exactly as it was.
pub fn transition(
    application: &mut ApplicationRow,
    target: &str,
) -> Result<ApplicationStatus, StatusError> {
    let next = target.parse::<ApplicationStatus>()?;
    application.status = next.as_str().to_string();
    Ok(next)
}

// ────────────────────────────────────────────────────────────────────────────
// Board grouping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatusColumn {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub applications: Vec<ApplicationRow>,
}

/// Applications partitioned by status. Every input row lands in exactly one
/// column or in `unexpected`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBoard {
    pub columns: Vec<StatusColumn>,
    pub unexpected: Vec<ApplicationRow>,
}

impl StatusBoard {
    pub fn total(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.applications.len())
            .sum::<usize>()
            + self.unexpected.len()
    }
}

/// Groups applications into one column per known status (canonical order,
/// empty columns included) plus a catch-all for unrecognized stored values.
pub fn group_by_status(applications: impl IntoIterator<Item = ApplicationRow>) -> StatusBoard {
    let mut columns: Vec<StatusColumn> = ApplicationStatus::ALL
        .into_iter()
        .map(|status| StatusColumn {
            status,
            label: status.label(),
            applications: Vec::new(),
        })
        .collect();
    let mut unexpected = Vec::new();

    for application in applications {
        match application.status.parse::<ApplicationStatus>() {
            Ok(status) => {
                if let Some(column) = columns.iter_mut().find(|c| c.status == status) {
                    column.applications.push(application);
                }
            }
            Err(_) => unexpected.push(application),
        }
    }

    StatusBoard {
        columns,
        unexpected,
    }
}
