//! Search orchestration: resolve coordinates (I/O, write-back), then hand off
//! to the pure ranker.

use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::geo::{Coordinate, Geocoder};
use crate::models::job::JobPosting;
use crate::search::query::SearchRequest;
use crate::search::ranker::{
    matches_title_or_company, rank_by_distance, rank_by_recency, within_salary_band, SearchHit,
};
use crate::store::JobStore;

pub async fn search_jobs(
    store: &dyn JobStore,
    geocoder: &Geocoder,
    request: &SearchRequest,
) -> Result<Vec<SearchHit>, AppError> {
    let jobs: Vec<JobPosting> = store
        .list_jobs()
        .await?
        .into_iter()
        .filter(|job| within_salary_band(job, &request.salary))
        .collect();

    let Some(radius) = request.radius else {
        return Ok(rank_by_recency(jobs, &request.query));
    };

    let center = match request.center {
        Some(center) => center,
        None => match geocoder.resolve(&request.location).await {
            Some(center) => center,
            None => {
                info!(
                    "Radius search center '{}' could not be resolved; returning no results",
                    request.location
                );
                return Ok(Vec::new());
            }
        },
    };

    let mut candidates: Vec<JobPosting> = jobs
        .into_iter()
        .filter(|job| matches_title_or_company(job, &request.query))
        .collect();

    resolve_missing_coordinates(store, geocoder, &mut candidates).await;

    let hits = rank_by_distance(candidates, center, radius, &request.query);
    debug!("Radius search ({radius} mi) matched {} postings", hits.len());
    Ok(hits)
}

/// Fills in coordinates for postings that lack one and persists each hit.
/// Idempotent: postings with a stored coordinate are skipped, unresolvable
/// ones are left without a coordinate.
pub async fn resolve_missing_coordinates(
    store: &dyn JobStore,
    geocoder: &Geocoder,
    jobs: &mut [JobPosting],
) -> usize {
    let mut resolved = 0;

    for job in jobs.iter_mut() {
        if job.coordinate().is_some() || job.location.trim().is_empty() {
            continue;
        }

        let Some(coordinate) = geocoder.resolve(&job.location).await else {
            debug!("Job {} location '{}' did not geocode", job.id, job.location);
            continue;
        };

        job.set_coordinate(coordinate);
        resolved += 1;
        write_back(store, job.id, coordinate).await;
    }

    resolved
}

async fn write_back(store: &dyn JobStore, job_id: uuid::Uuid, coordinate: Coordinate) {
    // The in-memory coordinate is still used for this request if the write fails.
    if let Err(e) = store.save_job_coordinate(job_id, coordinate).await {
        warn!("Failed to persist coordinate for job {job_id}: {e}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::geocoder::tests::{geocoder_with, ScriptedProvider};
    use crate::search::query::SalaryBand;
    use crate::search::ranker::tests::{at, make_job};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// In-memory job table honoring the "stored coordinate is authoritative" rule.
    #[derive(Default)]
    pub(crate) struct MemoryJobStore {
        pub(crate) jobs: Mutex<Vec<JobPosting>>,
        pub(crate) writes: Mutex<Vec<(Uuid, Coordinate)>>,
    }

    impl MemoryJobStore {
        pub(crate) fn with(jobs: Vec<JobPosting>) -> Self {
            Self {
                jobs: Mutex::new(jobs),
                writes: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
            Ok(self.jobs.lock().unwrap().clone())
        }

        async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
            Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
        }

        async fn save_job_coordinate(
            &self,
            id: Uuid,
            coordinate: Coordinate,
        ) -> Result<(), AppError> {
            self.writes.lock().unwrap().push((id, coordinate));
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
                if job.coordinate().is_none() {
                    job.set_coordinate(coordinate);
                }
            }
            Ok(())
        }
    }

    const AUSTIN: Coordinate = Coordinate {
        lat: 30.2672,
        lon: -97.7431,
    };
    const ROUND_ROCK: Coordinate = Coordinate {
        lat: 30.5083,
        lon: -97.6789,
    };

    fn radius_request(query: &str, location: &str, radius: f64) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            location: location.to_string(),
            radius: Some(radius),
            center: None,
            salary: SalaryBand::default(),
        }
    }

    #[tokio::test]
    async fn test_no_radius_ignores_location_and_geocoder() {
        let store = MemoryJobStore::with(vec![make_job("Software Engineer", "Acme", "Mars")]);
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let geocoder = geocoder_with(provider.clone());

        let request = SearchRequest {
            query: "engineer".to_string(),
            location: "Austin, TX".to_string(),
            ..Default::default()
        };
        let hits = search_jobs(&store, &geocoder, &request).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_center_fails_closed() {
        let store = MemoryJobStore::with(vec![at(
            make_job("Engineer", "Acme", "Austin"),
            AUSTIN.lat,
            AUSTIN.lon,
        )]);
        let geocoder = geocoder_with(Arc::new(ScriptedProvider::new(&[])));

        let hits = search_jobs(&store, &geocoder, &radius_request("", "Atlantis", 100.0))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_center_on_stored_coordinate() {
        let job = at(make_job("Engineer", "Acme", "Austin"), AUSTIN.lat, AUSTIN.lon);
        let store = MemoryJobStore::with(vec![job]);
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let geocoder = geocoder_with(provider.clone());

        let request = SearchRequest {
            center: Some(AUSTIN),
            ..radius_request("", "", 10.0)
        };
        let hits = search_jobs(&store, &geocoder, &request).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance_miles, Some(0.0));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_job_coordinate_is_geocoded_and_written_back() {
        let job = make_job("Engineer", "Acme", "Round Rock, TX");
        let job_id = job.id;
        let store = MemoryJobStore::with(vec![job]);
        let provider = Arc::new(ScriptedProvider::new(&[
            ("Austin, TX", AUSTIN),
            ("Round Rock, TX", ROUND_ROCK),
        ]));
        let geocoder = geocoder_with(provider);

        let hits = search_jobs(&store, &geocoder, &radius_request("", "Austin, TX", 25.0))
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(*store.writes.lock().unwrap(), vec![(job_id, ROUND_ROCK)]);
        let stored = store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(stored.coordinate(), Some(ROUND_ROCK));
    }

    #[tokio::test]
    async fn test_stored_coordinate_skips_geocoding() {
        // Location text points elsewhere, but the stored coordinate wins.
        let job = at(make_job("Engineer", "Acme", "Dallas, TX"), AUSTIN.lat, AUSTIN.lon);
        let store = MemoryJobStore::with(vec![job]);
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let geocoder = geocoder_with(provider.clone());

        let request = SearchRequest {
            center: Some(AUSTIN),
            ..radius_request("", "", 1.0)
        };
        let hits = search_jobs(&store, &geocoder, &request).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlocatable_postings_are_excluded() {
        let no_text = make_job("Engineer", "Acme", "");
        let bad_text = make_job("Engineer", "Acme", "Somewhere Unknown");
        let good = at(make_job("Engineer", "Acme", "Austin"), AUSTIN.lat, AUSTIN.lon);
        let store = MemoryJobStore::with(vec![no_text, bad_text, good]);
        let geocoder = geocoder_with(Arc::new(ScriptedProvider::new(&[])));

        let request = SearchRequest {
            center: Some(AUSTIN),
            ..radius_request("", "", 10_000.0)
        };
        let hits = search_jobs(&store, &geocoder, &request).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].job.location, "Austin");
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_radius_query_filters_before_geocoding() {
        let chef = make_job("Chef", "Diner", "Round Rock, TX");
        let store = MemoryJobStore::with(vec![chef]);
        let provider = Arc::new(ScriptedProvider::new(&[("Round Rock, TX", ROUND_ROCK)]));
        let geocoder = geocoder_with(provider.clone());

        let request = SearchRequest {
            center: Some(AUSTIN),
            ..radius_request("engineer", "", 50.0)
        };
        let hits = search_jobs(&store, &geocoder, &request).await.unwrap();

        assert!(hits.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_missing_is_idempotent() {
        let mut jobs = vec![make_job("Engineer", "Acme", "Round Rock, TX")];
        let store = MemoryJobStore::with(jobs.clone());
        let provider = Arc::new(ScriptedProvider::new(&[("Round Rock, TX", ROUND_ROCK)]));
        let geocoder = geocoder_with(provider.clone());

        assert_eq!(resolve_missing_coordinates(&store, &geocoder, &mut jobs).await, 1);
        assert_eq!(resolve_missing_coordinates(&store, &geocoder, &mut jobs).await, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
