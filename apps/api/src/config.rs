use anyhow::{bail, Context, Result};

use crate::matching::weights::MatchWeights;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When unset, geocode results are cached in process memory.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_default_country: String,
    pub geocode_cache_ttl_secs: u64,
    pub geocode_cache_max_entries: usize,
    pub match_weights: MatchWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            geocoder_url: optional_env("GEOCODER_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_user_agent: optional_env("GEOCODER_USER_AGENT")
                .unwrap_or_else(|| "jobsearch/1.0".to_string()),
            geocoder_timeout_secs: parse_env("GEOCODER_TIMEOUT_SECS", 5)?,
            geocoder_default_country: optional_env("GEOCODER_DEFAULT_COUNTRY")
                .unwrap_or_else(|| "USA".to_string()),
            geocode_cache_ttl_secs: parse_env("GEOCODE_CACHE_TTL_SECS", 86_400)?,
            geocode_cache_max_entries: parse_env("GEOCODE_CACHE_MAX_ENTRIES", 10_000)?,
            match_weights: match_weights_from_env()?,
        })
    }
}

fn match_weights_from_env() -> Result<MatchWeights> {
    let defaults = MatchWeights::default();
    let weights = MatchWeights {
        skills: parse_env("MATCH_WEIGHT_SKILLS", defaults.skills)?,
        position: parse_env("MATCH_WEIGHT_POSITION", defaults.position)?,
        company: parse_env("MATCH_WEIGHT_COMPANY", defaults.company)?,
        location: parse_env("MATCH_WEIGHT_LOCATION", defaults.location)?,
    };
    if !weights.is_valid() || weights.sum() <= 0.0 {
        bail!("MATCH_WEIGHT_* must be non-negative and not all zero, got {weights:?}");
    }
    Ok(weights)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
