//! Geocoder: free-text address to `Coordinate`.
//!
//! Resolution order for one address:
//! 1. cache lookup on the normalized address key
//! 2. per-key single-flight lock, then a second cache check
//! 3. provider lookups over the query variants until one matches
//! 4. cache the hit (misses are never cached)
//!
//! Provider failures never escape: they are logged and count as a miss.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::geo::cache::{address_key, CoordinateCache};
use crate::geo::provider::GeocodingProvider;
use crate::geo::Coordinate;

static UNIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\b(?:suite|ste|apt|unit)\b\.?\s*#?|#)\s*[a-z0-9][a-z0-9-]*")
        .expect("unit marker pattern is valid")
});

/// Builds the ordered, de-duplicated provider queries for an address.
///
/// Order: raw, unit-stripped, country-qualified, then the last two
/// comma-separated segments bare and country-qualified.
pub fn query_variants(address: &str, country: &str) -> Vec<String> {
    let raw = address.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![raw.to_string()];

    let stripped = strip_unit(raw);
    if !stripped.is_empty() {
        variants.push(stripped);
    }

    variants.push(qualify(raw, country));

    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() >= 2 {
        let tail = segments[segments.len() - 2..].join(", ");
        variants.push(qualify(&tail, country));
        variants.insert(variants.len() - 1, tail);
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

/// Removes "Suite 400", "Apt. 3B", "#12" style tokens and tidies the separators left behind.
fn strip_unit(address: &str) -> String {
    let removed = UNIT_MARKER.replace_all(address, "");
    let parts: Vec<String> = removed
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|part| !part.is_empty())
        .collect();
    parts.join(", ")
}

/// Appends the country unless it is already the last comma-separated segment.
fn qualify(query: &str, country: &str) -> String {
    let country = country.trim();
    let already_qualified = query
        .rsplit(',')
        .next()
        .is_some_and(|last| last.trim().eq_ignore_ascii_case(country));
    if country.is_empty() || already_qualified {
        query.to_string()
    } else {
        format!("{query}, {country}")
    }
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Shared geocoding service. Cheap to share behind an `Arc`.
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    cache: Arc<dyn CoordinateCache>,
    default_country: String,
    inflight: Mutex<HashMap<String, KeyLock>>,
}

impl Geocoder {
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        cache: Arc<dyn CoordinateCache>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            cache,
            default_country: default_country.into(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves an address, returning `None` when every variant misses.
    pub async fn resolve(&self, address: &str) -> Option<Coordinate> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        let key = address_key(address);
        if let Some(hit) = self.cache.get(&key).await {
            debug!("Geocode cache hit for '{address}'");
            return Some(hit);
        }

        let claim = self.claim_key(&key);
        let _held = claim.lock.lock().await;

        // Another request may have filled the entry while we waited.
        if let Some(hit) = self.cache.get(&key).await {
            return Some(hit);
        }

        let found = self.lookup_variants(address).await;
        if let Some(coordinate) = found {
            self.cache.put(&key, coordinate).await;
        }
        found
    }

    async fn lookup_variants(&self, address: &str) -> Option<Coordinate> {
        for query in query_variants(address, &self.default_country) {
            match self.provider.lookup(&query).await {
                Ok(Some(coordinate)) => {
                    debug!("Geocoded '{address}' via '{query}'");
                    return Some(coordinate);
                }
                Ok(None) => debug!("No geocode match for '{query}'"),
                Err(e) => warn!("Geocode provider failed for '{query}': {e}"),
            }
        }
        debug!("Exhausted geocode variants for '{address}'");
        None
    }

    fn claim_key(&self, key: &str) -> KeyClaim<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        let lock = inflight.entry(key.to_string()).or_default().clone();
        KeyClaim {
            inflight: &self.inflight,
            key: key.to_string(),
            lock,
        }
    }
}

/// A handle on one key's single-flight lock. Dropping it, including when the
/// owning future is cancelled, removes the map entry once nobody else holds it.
struct KeyClaim<'a> {
    inflight: &'a Mutex<HashMap<String, KeyLock>>,
    key: String,
    lock: KeyLock,
}

impl Drop for KeyClaim<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        let ours = inflight
            .get(&self.key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock));
        // Map entry + this handle: nobody else is waiting on the key.
        if ours && Arc::strong_count(&self.lock) <= 2 {
            inflight.remove(&self.key);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::cache::MemoryCoordinateCache;
    use crate::geo::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that knows a fixed set of exact queries and counts calls.
    pub(crate) struct ScriptedProvider {
        known: HashMap<String, Coordinate>,
        failing: Vec<String>,
        pub(crate) calls: AtomicUsize,
        pub(crate) queries: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(known: &[(&str, Coordinate)]) -> Self {
            Self {
                known: known.iter().map(|(q, c)| (q.to_string(), *c)).collect(),
                failing: vec![],
                calls: AtomicUsize::new(0),
                queries: Mutex::new(vec![]),
            }
        }

        fn failing_on(mut self, query: &str) -> Self {
            self.failing.push(query.to_string());
            self
        }
    }

    #[async_trait]
    impl GeocodingProvider for ScriptedProvider {
        async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            tokio::task::yield_now().await;
            if self.failing.iter().any(|f| f == query) {
                return Err(ProviderError::Status(503));
            }
            Ok(self.known.get(query).copied())
        }
    }

    /// Provider whose lookups never complete.
    struct HangingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeocodingProvider for HangingProvider {
        async fn lookup(&self, _query: &str) -> Result<Option<Coordinate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    pub(crate) fn geocoder_with(provider: Arc<ScriptedProvider>) -> Geocoder {
        let cache = Arc::new(MemoryCoordinateCache::new(chrono::Duration::hours(24), 100));
        Geocoder::new(provider, cache, "USA")
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_variants_order_and_dedup() {
        let variants = query_variants("123 Main St, Springfield, IL", "USA");
        assert_eq!(
            variants,
            vec![
                "123 Main St, Springfield, IL",
                "123 Main St, Springfield, IL, USA",
                "Springfield, IL",
                "Springfield, IL, USA",
            ]
        );
    }

    #[test]
    fn test_variants_strip_suite() {
        let variants = query_variants("123 Main St Suite 400", "USA");
        assert_eq!(
            variants,
            vec![
                "123 Main St Suite 400",
                "123 Main St",
                "123 Main St Suite 400, USA",
            ]
        );
    }

    #[test]
    fn test_strip_unit_markers() {
        assert_eq!(strip_unit("500 Oak Ave Apt. 3B, Austin, TX"), "500 Oak Ave, Austin, TX");
        assert_eq!(strip_unit("77 Pine Rd #12, Denver"), "77 Pine Rd, Denver");
        assert_eq!(strip_unit("9 Elm STE 200"), "9 Elm");
        assert_eq!(strip_unit("Stevens Point, WI"), "Stevens Point, WI");
        assert_eq!(strip_unit("123 Main St Suite #400"), "123 Main St");
        assert_eq!(strip_unit("8 Bay Rd, Apt # 7"), "8 Bay Rd");
    }

    #[test]
    fn test_variants_qualify_place_ending_in_country_letters() {
        let variants = query_variants("500 Foothill Blvd, Azusa", "USA");
        assert_eq!(
            variants,
            vec!["500 Foothill Blvd, Azusa", "500 Foothill Blvd, Azusa, USA"]
        );
    }

    #[test]
    fn test_qualify_skips_existing_country() {
        assert_eq!(qualify("Austin, TX, USA", "USA"), "Austin, TX, USA");
        assert_eq!(qualify("Austin, TX", "USA"), "Austin, TX, USA");
        assert_eq!(qualify("Austin, TX", ""), "Austin, TX");
        assert_eq!(qualify("Austin, TX, usa ", "USA"), "Austin, TX, usa ");
        assert_eq!(qualify("Azusa", "USA"), "Azusa, USA");
    }

    #[test]
    fn test_empty_input_has_no_variants() {
        assert!(query_variants("   ", "USA").is_empty());
    }

    #[tokio::test]
    async fn test_empty_address_skips_provider() {
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let geocoder = geocoder_with(provider.clone());

        assert_eq!(geocoder.resolve("  ").await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_suite_address_resolves_via_stripped_variant() {
        let target = coord(39.78, -89.65);
        let provider = Arc::new(ScriptedProvider::new(&[("123 Main St", target)]));
        let geocoder = geocoder_with(provider.clone());

        assert_eq!(geocoder.resolve("123 Main St Suite 400").await, Some(target));
        // Raw miss, then stripped hit; no further variants tried.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *provider.queries.lock().unwrap(),
            vec!["123 Main St Suite 400".to_string(), "123 Main St".to_string()]
        );
    }

    #[tokio::test]
    async fn test_provider_errors_are_misses() {
        let target = coord(30.27, -97.74);
        let provider = Arc::new(
            ScriptedProvider::new(&[("Austin, TX", target)])
                .failing_on("1 Congress Ave, Austin, TX"),
        );
        let geocoder = geocoder_with(provider);

        assert_eq!(geocoder.resolve("1 Congress Ave, Austin, TX").await, Some(target));
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let geocoder = geocoder_with(provider.clone());

        assert_eq!(geocoder.resolve("Nowhere").await, None);
        let first = provider.calls.load(Ordering::SeqCst);
        assert!(first > 0);

        assert_eq!(geocoder.resolve("Nowhere").await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), first * 2);
    }

    #[tokio::test]
    async fn test_hit_is_served_from_cache() {
        let target = coord(47.6, -122.3);
        let provider = Arc::new(ScriptedProvider::new(&[("Seattle", target)]));
        let geocoder = geocoder_with(provider.clone());

        assert_eq!(geocoder.resolve("Seattle").await, Some(target));
        assert_eq!(geocoder.resolve("  seattle ").await, Some(target));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_is_single_flight() {
        let target = coord(41.88, -87.63);
        let provider = Arc::new(ScriptedProvider::new(&[("Chicago", target)]));
        let geocoder = Arc::new(geocoder_with(provider.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let g = geocoder.clone();
                tokio::spawn(async move { g.resolve("Chicago").await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Some(target));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(geocoder.inflight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_resolve_releases_key() {
        let provider = Arc::new(HangingProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(MemoryCoordinateCache::new(chrono::Duration::hours(1), 100));
        let geocoder = Arc::new(Geocoder::new(provider.clone(), cache, "USA"));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let g = geocoder.clone();
            tasks.push(tokio::spawn(async move { g.resolve(&format!("addr {i}")).await }));
        }
        // A second caller queued behind the first on the same key.
        let g = geocoder.clone();
        tasks.push(tokio::spawn(async move { g.resolve("addr 0").await }));

        while provider.calls.load(Ordering::SeqCst) < 20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(geocoder.inflight.lock().unwrap().len(), 20);

        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            assert!(task.await.unwrap_err().is_cancelled());
        }
        assert!(geocoder.inflight.lock().unwrap().is_empty());
    }
}
