//! Configuration types for quizpack-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Remote API connection settings (endpoint, credential, per-call deadlines)
///
/// Used as a nested sub-config within [`Config`] (the `[api]` table in TOML).
/// `Debug` output redacts the session cookie.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the question manager site (default: "https://www.speedquizzing.com")
    ///
    /// Endpoint paths are appended to this URL's path, so a prefix such as
    /// `https://host/proxy` is kept.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `sq_session` cookie used to authenticate every request
    #[serde(default)]
    pub session_cookie: String,

    /// Protocol version marker sent with every batch fetch (default: "2")
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Deadline for a single key discovery request (default: 10 seconds)
    #[serde(default = "default_discovery_timeout", with = "duration_serde")]
    pub discovery_timeout: Duration,

    /// Deadline for a single batch fetch request (default: 15 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,

    /// Deadline for a single option lookup request (default: 10 seconds)
    #[serde(default = "default_options_timeout", with = "duration_serde")]
    pub options_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: String::new(),
            protocol_version: default_protocol_version(),
            user_agent: default_user_agent(),
            discovery_timeout: default_discovery_timeout(),
            fetch_timeout: default_fetch_timeout(),
            options_timeout: default_options_timeout(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session_cookie = if self.session_cookie.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("session_cookie", &session_cookie)
            .field("protocol_version", &self.protocol_version)
            .field("user_agent", &self.user_agent)
            .field("discovery_timeout", &self.discovery_timeout)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("options_timeout", &self.options_timeout)
            .finish()
    }
}

/// How keys discovered under more than one category filter are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Fetch every discovered key, even if another filter already yielded it
    #[default]
    Keep,
    /// Fetch each distinct key once; the first filter that yields it wins
    Skip,
}

/// Pipeline shape: category filters, worker pool capacities, progress cadence
///
/// Used as a nested sub-config within [`Config`] (the `[pipeline]` table in TOML).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Category filters queried during key discovery, in order
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Maximum in-flight batch fetch requests (default: 20)
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Maximum in-flight option lookup requests (default: 50)
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,

    /// Emit a progress signal after every N enrichment completions (default: 10)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Duplicate key handling across category filters (default: keep)
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            fetch_concurrency: default_fetch_concurrency(),
            enrich_concurrency: default_enrich_concurrency(),
            progress_interval: default_progress_interval(),
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }
}

/// Main configuration for a harvest run
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig) — endpoint, credential, per-call deadlines
/// - [`pipeline`](PipelineConfig) — category filters, pool capacities, progress cadence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output CSV path (default: "all_quizpacks.csv")
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            pipeline: PipelineConfig::default(),
            output_path: default_output_path(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text; absent fields take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            message: format!("invalid TOML: {}", e),
            key: None,
        })
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the settings a run cannot proceed without
    pub fn validate(&self) -> Result<()> {
        if self.api.session_cookie.trim().is_empty() {
            return Err(Error::config(
                "session_cookie",
                "session cookie is required to authenticate with the question manager",
            ));
        }
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(Error::config(
                "base_url",
                format!("invalid base URL '{}': {}", self.api.base_url, e),
            ));
        }
        if self.pipeline.categories.is_empty() {
            return Err(Error::config(
                "categories",
                "at least one category filter is required",
            ));
        }
        if self.pipeline.fetch_concurrency == 0 {
            return Err(Error::config(
                "fetch_concurrency",
                "fetch_concurrency must be greater than zero",
            ));
        }
        if self.pipeline.enrich_concurrency == 0 {
            return Err(Error::config(
                "enrich_concurrency",
                "enrich_concurrency must be greater than zero",
            ));
        }
        if self.pipeline.progress_interval == 0 {
            return Err(Error::config(
                "progress_interval",
                "progress_interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://www.speedquizzing.com".to_string()
}

fn default_protocol_version() -> String {
    "2".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/139.0.0.0 Safari/537.36"
        .to_string()
}

fn default_discovery_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_options_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_categories() -> Vec<String> {
    vec![
        "keypad".into(),
        "advanced".into(),
        "multi tap".into(),
        "nearest".into(),
    ]
}

fn default_fetch_concurrency() -> usize {
    20
}

fn default_enrich_concurrency() -> usize {
    50
}

fn default_progress_interval() -> usize {
    10
}

fn default_output_path() -> PathBuf {
    PathBuf::from("all_quizpacks.csv")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
