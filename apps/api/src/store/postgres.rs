use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::geo::Coordinate;
use crate::models::application::ApplicationRow;
use crate::models::job::JobPosting;
use crate::models::profile::{CandidateProfile, ProfileRow};
use crate::store::{ApplicationStore, CandidateStore, JobStore};

const JOB_COLUMNS: &str = "id, title, company, description, location, latitude, longitude, \
                           posted_at, salary_min, salary_max, owner_id";

const APPLICATION_COLUMNS: &str = "id, job_id, user_id, status, submitted_at, applicant_location, \
                                   applicant_latitude, applicant_longitude";

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY posted_at DESC");
        Ok(sqlx::query_as::<_, JobPosting>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        Ok(sqlx::query_as::<_, JobPosting>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_job_coordinate(&self, id: Uuid, coordinate: Coordinate) -> Result<(), AppError> {
        // Single statement: concurrent write-backs cannot interleave lat and lon.
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET latitude = $1, longitude = $2
            WHERE id = $3 AND (latitude IS NULL OR longitude IS NULL)
            "#,
        )
        .bind(coordinate.lat)
        .bind(coordinate.lon)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Stored coordinate for job {id}");
        }
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for PgStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateProfile>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, skills, desired_positions, desired_companies,
                   location, latitude, longitude
            FROM profiles
            WHERE is_recruiter = FALSE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    async fn get_candidate(&self, user_id: Uuid) -> Result<Option<CandidateProfile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, skills, desired_positions, desired_companies,
                   location, latitude, longitude
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CandidateProfile::from))
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        Ok(sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_applications(&self, job_id: Option<Uuid>) -> Result<Vec<ApplicationRow>, AppError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE ($1::uuid IS NULL OR job_id = $1) \
             ORDER BY submitted_at DESC"
        );
        Ok(sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE applications SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Application {id} not found")));
        }
        info!("Application {id} moved to '{status}'");
        Ok(())
    }

    async fn save_applicant_coordinate(
        &self,
        id: Uuid,
        coordinate: Coordinate,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE applications SET applicant_latitude = $1, applicant_longitude = $2 WHERE id = $3",
        )
        .bind(coordinate.lat)
        .bind(coordinate.lon)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
