//! Pure filtering and ordering. No I/O: coordinates must already be resolved.

use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::{distance_miles, Coordinate};
use crate::models::job::JobPosting;
use crate::search::query::SalaryBand;

const TITLE_RANK: u32 = 3;
const COMPANY_RANK: u32 = 2;
const DESCRIPTION_RANK: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub job: JobPosting,
    /// Present only when a radius filter was applied.
    pub distance_miles: Option<f64>,
    /// Text relevance: title 3, company 2, description 1. Zero for an empty query.
    pub rank: u32,
}

/// Case-insensitive substring match of `query` against title or company.
/// An empty query matches everything.
pub fn matches_title_or_company(job: &JobPosting, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || job.title.to_lowercase().contains(&query)
        || job.company.to_lowercase().contains(&query)
}

pub fn relevance_rank(job: &JobPosting, query: &str) -> u32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }
    let mut rank = 0;
    if job.title.to_lowercase().contains(&query) {
        rank += TITLE_RANK;
    }
    if job.company.to_lowercase().contains(&query) {
        rank += COMPANY_RANK;
    }
    if job.description.to_lowercase().contains(&query) {
        rank += DESCRIPTION_RANK;
    }
    rank
}

/// Keeps postings whose salary bounds overlap the band. Unknown bounds never exclude.
pub fn within_salary_band(job: &JobPosting, band: &SalaryBand) -> bool {
    let above_min = match (band.min, job.salary_max.or(job.salary_min)) {
        (Some(min), Some(top)) => top >= min,
        _ => true,
    };
    let below_max = match (band.max, job.salary_min.or(job.salary_max)) {
        (Some(max), Some(bottom)) => bottom <= max,
        _ => true,
    };
    above_min && below_max
}

/// "Any distance" ordering: text filter, newest first.
pub fn rank_by_recency(jobs: Vec<JobPosting>, query: &str) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = jobs
        .into_iter()
        .filter(|job| matches_title_or_company(job, query))
        .map(|job| SearchHit {
            rank: relevance_rank(&job, query),
            job,
            distance_miles: None,
        })
        .collect();

    hits.sort_by(|a, b| b.job.posted_at.cmp(&a.job.posted_at));
    hits
}

/// Radius ordering over postings whose coordinates were already resolved.
/// Postings without a coordinate are excluded; the rest are kept when within
/// `radius` and sorted nearest first, newest first on ties.
pub fn rank_by_distance(
    jobs: Vec<JobPosting>,
    center: Coordinate,
    radius: f64,
    query: &str,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = jobs
        .into_iter()
        .filter_map(|job| {
            let distance = distance_miles(center, job.coordinate()?);
            (distance <= radius).then(|| SearchHit {
                rank: relevance_rank(&job, query),
                job,
                distance_miles: Some(distance),
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        let da = a.distance_miles.unwrap_or(f64::INFINITY);
        let db = b.distance_miles.unwrap_or(f64::INFINITY);
        da.partial_cmp(&db)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.job.posted_at.cmp(&a.job.posted_at))
    });
    hits
}

// ────────────────────────────────────────────────────────────────────────────
// Map feed
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_NEARBY_RADIUS_MILES: f64 = 15.0;

#[derive(Debug, Clone, Serialize)]
pub struct NearbyJob {
    pub id: uuid::Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_miles: f64,
}

/// Postings with stored coordinates near `center`. Unlike search, the query
/// also matches descriptions and nothing is geocoded on the fly.
pub fn nearby(jobs: &[JobPosting], center: Coordinate, radius: f64, query: &str) -> Vec<NearbyJob> {
    let query = query.trim().to_lowercase();
    let mut found: Vec<NearbyJob> = jobs
        .iter()
        .filter(|job| {
            query.is_empty()
                || job.title.to_lowercase().contains(&query)
                || job.company.to_lowercase().contains(&query)
                || job.description.to_lowercase().contains(&query)
        })
        .filter_map(|job| {
            let at = job.coordinate()?;
            let distance = distance_miles(center, at);
            (distance <= radius).then(|| NearbyJob {
                id: job.id,
                title: job.title.clone(),
                company: job.company.clone(),
                location: job.location.clone(),
                lat: at.lat,
                lon: at.lon,
                distance_miles: (distance * 100.0).round() / 100.0,
            })
        })
        .collect();

    found.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(Ordering::Equal)
    });
    found
}
