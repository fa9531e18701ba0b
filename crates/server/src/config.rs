use bookstore::{AcceptMode, LookupConfig, PrefilterMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Key accepted when no API keys are configured.
pub const DEMO_API_KEY: &str = "demo-key-12345";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. A timed-out lookup is dropped together with
    /// its pending storage fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Rate limit: requests per minute per API key
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// API keys for authentication
    #[serde(default)]
    pub api_keys: HashSet<String>,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the Prometheus recorder and serve it on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Threshold applied to lookups that do not carry one
    #[serde(default = "default_threshold")]
    pub default_threshold: u8,

    #[serde(default)]
    pub accept_mode: AcceptMode,

    #[serde(default)]
    pub prefilter: PrefilterMode,

    /// JSON catalogue loaded at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            default_threshold: default_threshold(),
            accept_mode: AcceptMode::default(),
            prefilter: PrefilterMode::default(),
            seed_path: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server` config file and
    /// `BOOKSTORE_SERVER__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err.into());
            }
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(
                config::Environment::with_prefix("BOOKSTORE_SERVER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api_keys")
                    .try_parsing(true),
            );

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        config.apply_demo_key_fallback();

        Ok(config)
    }

    /// Accept [`DEMO_API_KEY`] when no keys are configured. Loading runs
    /// before tracing is set up, so `start_server` logs the warning.
    pub fn apply_demo_key_fallback(&mut self) {
        if self.api_keys.is_empty() {
            self.api_keys.insert(DEMO_API_KEY.to_string());
        }
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_keys.contains(DEMO_API_KEY)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_threshold > 100 {
            anyhow::bail!(
                "default_threshold must be <= 100, got {}",
                self.default_threshold
            );
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be >= 1");
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    /// The lookup engine settings carried by this server config.
    pub fn lookup_config(&self) -> LookupConfig {
        let mut lookup = LookupConfig::default();
        lookup.matcher.default_threshold = self.default_threshold;
        lookup.matcher.accept_mode = self.accept_mode;
        lookup.store.prefilter = self.prefilter;
        lookup.store.seed_path = self.seed_path.clone();
        lookup
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_rate_limit_per_minute() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_threshold() -> u8 {
    50
}
