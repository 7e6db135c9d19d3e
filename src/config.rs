use std::collections::HashMap;
use std::time::Duration;

use crate::error::EngineError;

/// Per-worker token budget: at most `max` jobs started in any rolling
/// `duration` window.
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub max: u32,
    pub duration: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit {
            max: 10,
            duration: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationThresholds {
    pub slippage_warn: f64,
    pub liquidity_warn: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        ValidationThresholds {
            slippage_warn: 0.10,
            liquidity_warn: 100_000.0,
        }
    }
}

/// Runtime configuration for the engine. Construct with [`EngineConfig::from_env`]
/// to take the documented defaults with environment overrides (the same
/// `std::env::var` pattern used elsewhere for secrets/paths), or build one by
/// hand for tests.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub quote_deadline: Duration,
    pub worker_concurrency: usize,
    pub worker_rate_limit: RateLimit,
    pub quote_retries: u32,
    pub quote_backoff_base: Duration,
    pub swap_retries: u32,
    pub swap_backoff_base: Duration,
    pub venue_speed_rank: HashMap<String, i32>,
    pub validation_thresholds: ValidationThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            quote_deadline: Duration::from_secs(10),
            worker_concurrency: 5,
            worker_rate_limit: RateLimit::default(),
            quote_retries: 3,
            quote_backoff_base: Duration::from_secs(5),
            swap_retries: 2,
            swap_backoff_base: Duration::from_secs(10),
            venue_speed_rank: default_speed_rank(),
            validation_thresholds: ValidationThresholds::default(),
        }
    }
}

fn default_speed_rank() -> HashMap<String, i32> {
    [("jupiter", 10), ("orca", 8), ("raydium", 6), ("meteora", 7)]
        .into_iter()
        .map(|(venue, rank)| (venue.to_string(), rank))
        .collect()
}

impl EngineConfig {
    /// Take the defaults, overriding anything set via environment variables.
    /// Unset variables keep their default; malformed ones are reported as a
    /// validation error rather than silently ignored.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut cfg = EngineConfig::default();

        if let Ok(v) = std::env::var("QUOTE_DEADLINE_MS") {
            cfg.quote_deadline = Duration::from_millis(parse_env("QUOTE_DEADLINE_MS", &v)?);
        }
        if let Ok(v) = std::env::var("WORKER_CONCURRENCY") {
            cfg.worker_concurrency = parse_env("WORKER_CONCURRENCY", &v)? as usize;
        }
        if let Ok(v) = std::env::var("WORKER_RATE_LIMIT_MAX") {
            cfg.worker_rate_limit.max = parse_env("WORKER_RATE_LIMIT_MAX", &v)? as u32;
        }
        if let Ok(v) = std::env::var("QUOTE_RETRIES") {
            cfg.quote_retries = parse_env("QUOTE_RETRIES", &v)? as u32;
        }
        if let Ok(v) = std::env::var("SWAP_RETRIES") {
            cfg.swap_retries = parse_env("SWAP_RETRIES", &v)? as u32;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.quote_deadline.is_zero() {
            return Err(EngineError::Validation(
                "quote_deadline must be greater than zero".into(),
            ));
        }
        if self.worker_concurrency == 0 {
            return Err(EngineError::Validation(
                "worker_concurrency must be at least 1".into(),
            ));
        }
        if self.quote_retries == 0 || self.swap_retries == 0 {
            return Err(EngineError::Validation(
                "quote_retries and swap_retries must each be at least 1".into(),
            ));
        }
        if self.worker_rate_limit.max == 0 {
            return Err(EngineError::Validation(
                "worker_rate_limit.max must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn speed_rank(&self, venue: &str) -> i32 {
        self.venue_speed_rank.get(venue).copied().unwrap_or(0)
    }
}

fn parse_env(name: &str, raw: &str) -> Result<u64, EngineError> {
    raw.parse::<u64>()
        .map_err(|_| EngineError::Validation(format!("{name}: invalid integer '{raw}'")))
}
