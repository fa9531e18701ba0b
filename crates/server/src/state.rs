use crate::config::ServerConfig;
use crate::error::ServerResult;
use bookstore::Lookup;
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    /// Store and matcher shared across requests
    pub lookup: Arc<Lookup>,

    /// Render handle of the installed Prometheus recorder, if any
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build the store (seeded when configured) and matcher described by `config`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let lookup = Lookup::from_config(&config.lookup_config())?;
        Ok(Self::with_lookup(config, Arc::new(lookup)))
    }

    pub fn with_lookup(config: ServerConfig, lookup: Arc<Lookup>) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            lookup,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Count a request against `key`'s per-minute budget.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// Server metadata for the authenticated metadata endpoint
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
    pub books: usize,
    pub customers: usize,
    pub orders: usize,
}
