//! TOML configuration for the URL scraper.
//!
//! Every setting has a compiled-in default, so an empty or partial file is
//! valid. The config file path can come from the CLI, the
//! `URLSCRAPER_CONFIG` environment variable, or `./urlscraper.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "URLSCRAPER_CONFIG";

/// Config file picked up from the working directory when nothing else is set.
pub const DEFAULT_CONFIG_FILE: &str = "urlscraper.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve and load configuration, in order:
    /// 1. `explicit`, if given.
    /// 2. The path in `URLSCRAPER_CONFIG`.
    /// 3. `./urlscraper.toml`, if it exists.
    /// 4. Compiled-in defaults.
    ///
    /// A file that is named explicitly (1 or 2) but cannot be loaded is an
    /// error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&env_path))
                .with_context(|| format!("{} is set but could not be loaded", CONFIG_ENV));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.store.capacity == 0 {
            bail!("store.capacity must be greater than zero");
        }
        if self.ingest.queue_capacity == 0 {
            bail!("ingest.queue_capacity must be greater than zero");
        }
        if self.ingest.workers == 0 {
            bail!("ingest.workers must be greater than zero");
        }
        if self.ingest.refresh_interval_sec == 0 {
            bail!("ingest.refresh_interval_sec must be greater than zero");
        }
        if self.client.timeout_sec == 0 {
            bail!("client.timeout_sec must be greater than zero");
        }
        if self.server.enqueue_timeout_sec == 0 {
            bail!("server.enqueue_timeout_sec must be greater than zero");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port for the HTTP listener.
    pub listen_address: String,
    /// How long a submission may wait for space in the intake queue.
    pub enqueue_timeout_sec: u64,
    /// Number of records returned by `GET /api/v1/urls`.
    pub fetch_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            enqueue_timeout_sec: 10,
            fetch_limit: 50,
        }
    }
}

impl ServerConfig {
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_secs(self.enqueue_timeout_sec)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of tracked URLs before the oldest is evicted.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Intake queue, worker pool, and benchmark refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Bounded intake queue size; submissions wait when it is full.
    pub queue_capacity: usize,
    /// Concurrent validation workers (also used for refresh batches).
    pub workers: usize,
    /// Seconds between benchmark refresh cycles.
    pub refresh_interval_sec: u64,
    /// Number of most recently touched URLs re-benchmarked per cycle.
    pub refresh_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            workers: 3,
            refresh_interval_sec: 60,
            refresh_batch_size: 10,
        }
    }
}

impl IngestConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_sec)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout, covering connect, response, and body drain.
    pub timeout_sec: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_sec: 10 }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Compact human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
