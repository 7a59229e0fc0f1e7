//! Configuration types for build3d-dock
//!
//! The configuration is read from a YAML file. Only `input_smi`, `API_TOKEN`
//! and `dockfiles_dir` are required; everything else has a default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default docking executable (DOCK 3.8 install on the lab file server)
pub const DEFAULT_DOCK_EXECUTABLE: &str =
    "/nfs/soft/dock/versions/dock38/DOCK/ucsfdock/docking/DOCK/dock64";

/// Default TLDR API root
pub const DEFAULT_API_BASE_URL: &str = "https://tldr.docking.org/api";

/// Remote job service settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, job endpoints are appended to it (default: TLDR)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Memo attached to every submission
    #[serde(default = "default_memo")]
    pub memo: String,

    /// Wait between status checks (default: 20 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Maximum number of status checks before giving up (None = poll forever)
    ///
    /// The service can report statuses this client does not recognize; those
    /// are waited out like `Running`, so without a limit a stuck job would
    /// be polled indefinitely.
    #[serde(default = "default_max_polls")]
    pub max_polls: Option<u32>,

    /// Timeout applied to each HTTP request, including a whole artifact
    /// download (default: 300 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Retry behavior for connection failures and timeouts
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            memo: default_memo(),
            poll_interval: default_poll_interval(),
            max_polls: default_max_polls(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Local directory layout and docking executable
///
/// Used as a flattened sub-config within [`Config`]. Relative paths are
/// resolved against the working directory given to the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DockingConfig {
    /// Directory holding the receptor files and `INDOCK`
    pub dockfiles_dir: PathBuf,

    /// Docking program, looked up in PATH when it is not an existing file
    #[serde(default = "default_dock_executable")]
    pub dock_executable: PathBuf,

    /// Where job artifacts are downloaded and extracted (default: "build3d")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Docking run directory (default: "dock")
    #[serde(default = "default_dock_dir")]
    pub dock_dir: PathBuf,

    /// Final location of the docked poses (default: "output.mol2")
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
}

impl DockingConfig {
    /// Create a docking config with default paths around `dockfiles_dir`
    pub fn new(dockfiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            dockfiles_dir: dockfiles_dir.into(),
            dock_executable: default_dock_executable(),
            download_dir: default_download_dir(),
            dock_dir: default_dock_dir(),
            output_file: default_output_file(),
        }
    }
}

/// Main configuration
///
/// Sub-config fields are flattened, so the YAML file is a single flat
/// mapping:
///
/// ```yaml
/// input_smi: "CCO"
/// API_TOKEN: "secret"
/// dockfiles_dir: /data/cyp3a4/dockfiles
/// poll_interval: 30
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// SMILES string of the ligand to build and dock
    pub input_smi: String,

    /// TLDR API token
    #[serde(rename = "API_TOKEN")]
    pub api_token: String,

    /// Remote job service settings
    #[serde(flatten)]
    pub api: ApiConfig,

    /// Local layout and docking executable
    #[serde(flatten)]
    pub docking: DockingConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> Result<()> {
        if self.input_smi.trim().is_empty() {
            return Err(Error::config("input_smi", "input_smi must not be empty"));
        }
        if self.api_token.trim().is_empty() {
            return Err(Error::config("API_TOKEN", "API_TOKEN must not be empty"));
        }
        if self.api.poll_interval.is_zero() {
            return Err(Error::config(
                "poll_interval",
                "poll_interval must be greater than zero",
            ));
        }
        if self.api.max_polls == Some(0) {
            return Err(Error::config(
                "max_polls",
                "max_polls must be at least 1 (use null to poll without limit)",
            ));
        }
        if self.api.request_timeout.is_zero() {
            return Err(Error::config(
                "request_timeout",
                "request_timeout must be greater than zero",
            ));
        }
        let multiplier = self.api.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                format!("retry.backoff_multiplier must be a finite number >= 1.0, got {multiplier}"),
            ));
        }
        match url::Url::parse(&self.api.api_base_url) {
            Ok(url) if !url.cannot_be_a_base() && matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => {
                return Err(Error::config(
                    "api_base_url",
                    format!("{} is not an http(s) base URL", self.api.api_base_url),
                ));
            }
            Err(e) => {
                return Err(Error::config(
                    "api_base_url",
                    format!("invalid URL {}: {}", self.api.api_base_url, e),
                ));
            }
        }
        Ok(())
    }
}

/// Retry configuration for transient transport failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_memo() -> String {
    "Building of CYP3A4 ligands".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(20)
}

fn default_max_polls() -> Option<u32> {
    // six hours at the default interval
    Some(1080)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_dock_executable() -> PathBuf {
    PathBuf::from(DEFAULT_DOCK_EXECUTABLE)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("build3d")
}

fn default_dock_dir() -> PathBuf {
    PathBuf::from("dock")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("output.mol2")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
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
