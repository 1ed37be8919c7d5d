//! Configuration for qnet-daemon
//!
//! Loaded once at startup from an optional file plus `QNET__`-prefixed
//! environment variables (`QNET__DATABASE_PATH`, `QNET__INSIGHT__MODEL`, ...),
//! validated, and handed to each component's constructor.

use crate::error::ConfigError;
use qnet_types::{NormalizationFactors, QUBITS};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Simulator identifier; informational only
    pub quantum_device: String,

    /// Number of simulated qubits; the encoding circuit requires 4
    pub quantum_wires: usize,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Bearer credential for the completion service
    pub openai_api_key: ApiKey,

    /// Static factor override; when absent, factors are requested from the
    /// completion service on every cycle
    #[serde(default)]
    pub normalization_factors: Option<NormalizationFactors>,

    /// Completion service configuration
    #[serde(default)]
    pub insight: InsightConfig,

    /// Cycle deadlines and enrichment behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Measurement probe
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secret that never shows up in `Debug` output
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// Completions endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Completion length limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cycle deadlines and enrichment behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for one probe capture in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Deadline for one storage call in seconds
    #[serde(default = "default_storage_timeout")]
    pub storage_timeout_secs: u64,

    /// Request commentary for every new record
    #[serde(default = "default_true")]
    pub enrichment_enabled: bool,

    /// Maximum enrichment requests in flight
    #[serde(default = "default_max_enrichments")]
    pub max_concurrent_enrichments: usize,

    /// Period of the `watch` loop in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Number of records re-analyzed by `recent --analyze`
    #[serde(default = "default_review_limit")]
    pub review_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            storage_timeout_secs: default_storage_timeout(),
            enrichment_enabled: true,
            max_concurrent_enrichments: default_max_enrichments(),
            interval_secs: default_interval(),
            review_limit: default_review_limit(),
        }
    }
}

impl PipelineConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Measurement probe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeConfig {
    /// Program and arguments printing one JSON measurement on stdout
    #[serde(default)]
    pub command: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    120
}

fn default_storage_timeout() -> u64 {
    10
}

fn default_max_enrichments() -> usize {
    4
}

fn default_interval() -> u64 {
    300
}

fn default_review_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("QNET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast checks on values that deserialized but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantum_device.trim().is_empty() {
            return Err(ConfigError::Invalid("quantum_device must not be empty".into()));
        }
        if self.quantum_wires != QUBITS {
            return Err(ConfigError::Invalid(format!(
                "quantum_wires must be {}, got {}",
                QUBITS, self.quantum_wires
            )));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }
        if self.openai_api_key.expose().trim().is_empty() {
            return Err(ConfigError::Invalid("openai_api_key must not be empty".into()));
        }
        if let Some(factors) = &self.normalization_factors {
            factors
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.insight.timeout_secs == 0 || self.insight.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "insight.timeout_secs and insight.max_tokens must be > 0".into(),
            ));
        }
        if self.pipeline.probe_timeout_secs == 0 || self.pipeline.storage_timeout_secs == 0 {
            return Err(ConfigError::Invalid("pipeline timeouts must be > 0".into()));
        }
        if self.pipeline.max_concurrent_enrichments == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_concurrent_enrichments must be >= 1".into(),
            ));
        }
        if self.pipeline.interval_secs == 0 {
            return Err(ConfigError::Invalid("pipeline.interval_secs must be > 0".into()));
        }
        Ok(())
    }
}
