//! Persistence collaborators. The core only reads and writes the fields it
//! owns (job coordinates, application status, applicant coordinates);
//! everything else about these tables belongs to the surrounding app.

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::geo::Coordinate;
use crate::models::application::ApplicationRow;
use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;

pub use postgres::PgStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>, AppError>;

    /// Persists a resolved coordinate. A coordinate already stored on the row
    /// is left untouched.
    async fn save_job_coordinate(&self, id: Uuid, coordinate: Coordinate) -> Result<(), AppError>;
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<CandidateProfile>, AppError>;

    async fn get_candidate(&self, user_id: Uuid) -> Result<Option<CandidateProfile>, AppError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError>;

    /// All applications, or only those for one job.
    async fn list_applications(&self, job_id: Option<Uuid>) -> Result<Vec<ApplicationRow>, AppError>;

    async fn update_status(&self, id: Uuid, status: &str) -> Result<(), AppError>;

    async fn save_applicant_coordinate(
        &self,
        id: Uuid,
        coordinate: Coordinate,
    ) -> Result<(), AppError>;
}
