//! Geocode cache, owned by the `Geocoder`.
//!
//! Two backends behind `CoordinateCache`:
//! - `MemoryCoordinateCache`: TTL + capacity eviction, clock injectable for tests.
//! - `RedisCoordinateCache`: shared across processes, TTL enforced by `SET EX`.
//!
//! Only successful resolutions are stored. Misses are never negative-cached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::geo::Coordinate;

const KEY_PREFIX: &str = "geocode:";

/// Canonical cache key for a free-text address: lowercase, single-spaced, trimmed.
pub fn address_key(address: &str) -> String {
    let collapsed = address.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{KEY_PREFIX}{}", collapsed.to_lowercase())
}

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cache trait
// ────────────────────────────────────────────────────────────────────────────

/// Read-through store for resolved coordinates. Backends never fail loudly:
/// a broken cache degrades to a miss.
#[async_trait]
pub trait CoordinateCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Coordinate>;
    async fn put(&self, key: &str, coordinate: Coordinate);
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct CachedCoordinate {
    coordinate: Coordinate,
    expires_at: DateTime<Utc>,
}

/// Process-local cache. Entries expire after `ttl`; when `max_entries` is
/// reached, expired entries are purged first and then the entry closest to
/// expiry is evicted.
pub struct MemoryCoordinateCache {
    entries: Mutex<HashMap<String, CachedCoordinate>>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl MemoryCoordinateCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedCoordinate>> {
        // A poisoned map still holds valid coordinates; keep serving it.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl CoordinateCache for MemoryCoordinateCache {
    async fn get(&self, key: &str) -> Option<Coordinate> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.coordinate),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, coordinate: Coordinate) {
        let now = self.clock.now();
        let mut entries = self.lock();

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, e| e.expires_at > now);
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("Geocode cache full, evicting {oldest}");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CachedCoordinate {
                coordinate,
                expires_at: now + self.ttl,
            },
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

/// Redis-backed cache. Values are stored as JSON `{"lat":..,"lon":..}`.
pub struct RedisCoordinateCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisCoordinateCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl CoordinateCache for RedisCoordinateCache {
    async fn get(&self, key: &str) -> Option<Coordinate> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Redis unavailable for geocode cache read: {e}");
                return None;
            }
        };

        let raw: Option<String> = match conn.get(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Redis GET {key} failed: {e}");
                return None;
            }
        };

        raw.and_then(|s| serde_json::from_str::<Coordinate>(&s).ok())
            .and_then(|c| Coordinate::new(c.lat, c.lon))
    }

    async fn put(&self, key: &str, coordinate: Coordinate) {
        let payload = match serde_json::to_string(&coordinate) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to encode coordinate for {key}: {e}");
                return;
            }
        };

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Redis unavailable for geocode cache write: {e}");
                return;
            }
        };

        if let Err(e) = conn.set_ex::<_, _, ()>(key, payload, self.ttl_secs).await {
            warn!("Redis SET {key} failed: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Manually advanced clock.
    pub(crate) struct FakeClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Mutex::new(Utc::now()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_address_key_normalizes() {
        assert_eq!(
            address_key("  123  Main St,\tSpringfield "),
            "geocode:123 main st, springfield"
        );
        assert_eq!(address_key("Austin, TX"), address_key("austin,   tx"));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let clock = Arc::new(FakeClock::new());
        let cache = MemoryCoordinateCache::with_clock(Duration::hours(24), 10, clock.clone());

        cache.put("k", coord(1.0, 2.0)).await;
        clock.advance(Duration::hours(23));
        assert_eq!(cache.get("k").await, Some(coord(1.0, 2.0)));

        clock.advance(Duration::hours(2));
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_closest_to_expiry() {
        let clock = Arc::new(FakeClock::new());
        let cache = MemoryCoordinateCache::with_clock(Duration::hours(1), 2, clock.clone());

        cache.put("a", coord(1.0, 1.0)).await;
        clock.advance(Duration::minutes(1));
        cache.put("b", coord(2.0, 2.0)).await;
        clock.advance(Duration::minutes(1));
        cache.put("c", coord(3.0, 3.0)).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").await, None);
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_same_key_does_not_evict() {
        let clock = Arc::new(FakeClock::new());
        let cache = MemoryCoordinateCache::with_clock(Duration::hours(1), 2, clock);

        cache.put("a", coord(1.0, 1.0)).await;
        cache.put("b", coord(2.0, 2.0)).await;
        cache.put("a", coord(5.0, 5.0)).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").await, Some(coord(5.0, 5.0)));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let clock = Arc::new(FakeClock::new());
        let cache = MemoryCoordinateCache::with_clock(Duration::minutes(5), 10, clock.clone());

        cache.put("a", coord(1.0, 1.0)).await;
        clock.advance(Duration::minutes(3));
        cache.put("b", coord(2.0, 2.0)).await;
        clock.advance(Duration::minutes(3));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
