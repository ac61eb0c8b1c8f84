mod applications;
mod config;
mod db;
mod errors;
mod geo;
mod matching;
mod models;
mod routes;
mod search;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::geo::cache::{CoordinateCache, MemoryCoordinateCache, RedisCoordinateCache};
use crate::geo::provider::HttpGeocodingProvider;
use crate::geo::Geocoder;
use crate::matching::scorer::WeightedMatchScorer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobsearch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize geocoder
    let provider = HttpGeocodingProvider::new(
        config.geocoder_url.clone(),
        config.geocoder_user_agent.clone(),
        Duration::from_secs(config.geocoder_timeout_secs),
    )
    .context("Failed to build geocoding HTTP client")?;
    let cache = build_coordinate_cache(&config)?;
    let geocoder = Arc::new(Geocoder::new(
        Arc::new(provider),
        cache,
        config.geocoder_default_country.clone(),
    ));
    info!("Geocoder initialized ({})", config.geocoder_url);

    // Initialize match scorer
    let match_scorer = Arc::new(WeightedMatchScorer::new(config.match_weights));
    info!("Match weights: {:?}", config.match_weights);

    // Build app state
    let state = AppState {
        jobs: store.clone(),
        candidates: store.clone(),
        applications: store,
        geocoder,
        match_scorer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when REDIS_URL is configured, otherwise an in-process cache with a
/// background task that sweeps expired entries.
fn build_coordinate_cache(config: &Config) -> Result<Arc<dyn CoordinateCache>> {
    if let Some(url) = &config.redis_url {
        let client = redis::Client::open(url.clone())?;
        info!("Geocode cache: Redis");
        return Ok(Arc::new(RedisCoordinateCache::new(
            client,
            config.geocode_cache_ttl_secs,
        )));
    }

    let ttl_secs = i64::try_from(config.geocode_cache_ttl_secs)
        .context("GEOCODE_CACHE_TTL_SECS is out of range")?;
    let cache = Arc::new(MemoryCoordinateCache::new(
        chrono::Duration::seconds(ttl_secs),
        config.geocode_cache_max_entries,
    ));
    info!(
        "Geocode cache: in-memory (max {} entries)",
        config.geocode_cache_max_entries
    );

    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired();
            debug!("Purged {purged} expired geocode entries ({} left)", sweeper.len());
        }
    });

    Ok(cache)
}
