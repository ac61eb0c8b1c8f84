//! Match scoring: a pluggable scorer measuring a candidate profile against a job posting.
//!
//! Default: `WeightedMatchScorer` (pure, deterministic).
//!
//! Four dimensions, each evaluated only when both sides carry the data it needs:
//! - skills: share of candidate skills found in title + description + company
//! - position: any desired position ⊂ title or title ⊂ desired position
//! - company: same reciprocal substring test against the job company
//! - location: distance bands on coordinates, else a free-text reciprocal match
//!
//! score = earned / Σ(weights of evaluated dimensions) × 100, capped at 100.
//! A dimension that cannot be evaluated does not count against the candidate.

use serde::Serialize;
use uuid::Uuid;

use crate::geo::distance_miles;
use crate::matching::weights::{
    DistanceBand, MatchWeights, DEFAULT_DISTANCE_BANDS, TEXT_LOCATION_FRACTION,
};
use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;

pub const MAX_SCORE: f64 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Skills,
    Position,
    Company,
    Location,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub earned: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// 0 to 100
    pub score: f64,
    /// Evaluated dimensions only.
    pub dimensions: Vec<DimensionScore>,
    pub distance_miles: Option<f64>,
}

impl MatchReport {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Carried in `AppState` as `Arc<dyn MatchScorer>` so the formula can be
/// swapped without touching handlers.
pub trait MatchScorer: Send + Sync {
    fn score(&self, job: &JobPosting, candidate: &CandidateProfile) -> MatchReport;
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedMatchScorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WeightedMatchScorer {
    pub weights: MatchWeights,
    pub bands: Vec<DistanceBand>,
    pub text_location_fraction: f64,
}

impl Default for WeightedMatchScorer {
    fn default() -> Self {
        Self::new(MatchWeights::default())
    }
}

impl WeightedMatchScorer {
    pub fn new(weights: MatchWeights) -> Self {
        Self {
            weights,
            bands: DEFAULT_DISTANCE_BANDS.to_vec(),
            text_location_fraction: TEXT_LOCATION_FRACTION,
        }
    }
}

impl MatchScorer for WeightedMatchScorer {
    fn score(&self, job: &JobPosting, candidate: &CandidateProfile) -> MatchReport {
        let mut dimensions = Vec::with_capacity(4);
        let mut distance = None;

        if let Some(fraction) = skills_fraction(job, &candidate.skills) {
            dimensions.push(scored(Dimension::Skills, fraction, self.weights.skills));
        }

        if let Some(hit) = reciprocal_match(&job.title, &candidate.desired_positions) {
            dimensions.push(scored(Dimension::Position, flag(hit), self.weights.position));
        }

        if let Some(hit) = reciprocal_match(&job.company, &candidate.desired_companies) {
            dimensions.push(scored(Dimension::Company, flag(hit), self.weights.company));
        }

        match (job.coordinate(), candidate.coordinate) {
            (Some(a), Some(b)) => {
                let miles = distance_miles(a, b);
                distance = Some(miles);
                let fraction = self
                    .bands
                    .iter()
                    .find(|band| miles <= band.max_miles)
                    .map_or(0.0, |band| band.fraction);
                dimensions.push(scored(Dimension::Location, fraction, self.weights.location));
            }
            _ => {
                if let Some(hit) = text_location_match(&job.location, &candidate.location) {
                    let fraction = if hit { self.text_location_fraction } else { 0.0 };
                    dimensions.push(scored(Dimension::Location, fraction, self.weights.location));
                }
            }
        }

        let evaluated: f64 = dimensions.iter().map(|d| d.weight).sum();
        let earned: f64 = dimensions.iter().map(|d| d.earned).sum();
        let score = if evaluated > 0.0 {
            (earned / evaluated * MAX_SCORE).clamp(0.0, MAX_SCORE)
        } else {
            0.0
        };

        MatchReport {
            score,
            dimensions,
            distance_miles: distance,
        }
    }
}

fn scored(dimension: Dimension, fraction: f64, weight: f64) -> DimensionScore {
    DimensionScore {
        dimension,
        earned: fraction.clamp(0.0, 1.0) * weight,
        weight,
    }
}

fn flag(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

fn normalized_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// `None` when the candidate lists no skills.
fn skills_fraction(job: &JobPosting, skills: &[String]) -> Option<f64> {
    let skills = normalized_tokens(skills);
    if skills.is_empty() {
        return None;
    }
    let haystack = format!("{} {} {}", job.title, job.description, job.company).to_lowercase();
    let found = skills.iter().filter(|s| haystack.contains(s.as_str())).count();
    Some(found as f64 / skills.len() as f64)
}

/// `None` when either side is empty; otherwise whether any token and the
/// target contain one another.
fn reciprocal_match(target: &str, tokens: &[String]) -> Option<bool> {
    let target = target.trim().to_lowercase();
    let tokens = normalized_tokens(tokens);
    if target.is_empty() || tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .any(|t| target.contains(t.as_str()) || t.contains(target.as_str())),
    )
}

fn text_location_match(job_location: &str, candidate_location: &str) -> Option<bool> {
    let job_location = job_location.trim().to_lowercase();
    let candidate_location = candidate_location.trim().to_lowercase();
    if job_location.is_empty() || candidate_location.is_empty() {
        return None;
    }
    Some(
        job_location.contains(&candidate_location) || candidate_location.contains(&job_location),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Capped ranking
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub user_id: Uuid,
    pub report: MatchReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job: JobPosting,
    pub report: MatchReport,
}

/// Keeps the best `limit` items, score descending, earlier items first on ties.
/// Stops consuming input once the list is full of perfect scores.
fn top_scored<T>(
    items: impl IntoIterator<Item = T>,
    limit: usize,
    mut report_for: impl FnMut(&T) -> MatchReport,
) -> Vec<(T, MatchReport)> {
    let mut best: Vec<(T, MatchReport)> = Vec::with_capacity(limit.min(64));
    if limit == 0 {
        return best;
    }

    let mut items = items.into_iter();
    while !(best.len() == limit && best.iter().all(|(_, r)| r.score >= MAX_SCORE)) {
        let Some(item) = items.next() else {
            break;
        };

        let report = report_for(&item);
        let position = best.partition_point(|(_, r)| r.score >= report.score);
        if position < limit {
            best.insert(position, (item, report));
            best.truncate(limit);
        }
    }

    best
}

/// Recruiter view: the best candidates for one job.
pub fn rank_candidates<'a>(
    scorer: &dyn MatchScorer,
    job: &JobPosting,
    candidates: impl IntoIterator<Item = &'a CandidateProfile>,
    limit: usize,
) -> Vec<CandidateMatch> {
    top_scored(candidates, limit, |c| scorer.score(job, c))
        .into_iter()
        .map(|(candidate, report)| CandidateMatch {
            user_id: candidate.user_id,
            report,
        })
        .collect()
}

/// Job-seeker view: the best postings for one candidate.
pub fn suggest_jobs(
    scorer: &dyn MatchScorer,
    candidate: &CandidateProfile,
    jobs: impl IntoIterator<Item = JobPosting>,
    limit: usize,
) -> Vec<JobMatch> {
    top_scored(jobs, limit, |job| scorer.score(job, candidate))
        .into_iter()
        .map(|(job, report)| JobMatch { job, report })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
