//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ecopack.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".ecopack.toml";

/// Upper bound accepted for `server.retries`.
pub const MAX_RETRIES: u32 = 10;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Recommendation service settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Baselines for the derived metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// History retention settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Local state settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Recommendation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on transient failures.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    250
}

/// Reference values the savings are measured against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Baseline CO2 per unit.
    #[serde(default = "default_baseline")]
    pub baseline_co2: f64,

    /// Baseline cost per unit.
    #[serde(default = "default_baseline")]
    pub baseline_cost: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline_co2: default_baseline(),
            baseline_cost: default_baseline(),
        }
    }
}

fn default_baseline() -> f64 {
    10.0
}

/// History retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Materials kept per run for display and charts.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Materials of the latest run included in exports.
    #[serde(default = "default_export_limit")]
    pub export_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            display_limit: default_display_limit(),
            export_limit: default_export_limit(),
        }
    }
}

fn default_display_limit() -> usize {
    crate::history::DISPLAY_LIMIT
}

fn default_export_limit() -> usize {
    crate::history::EXPORT_LIMIT
}

/// Local state settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for saved form values. Defaults to the per-user data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn effective_state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(crate::store::FormStore::default_dir)
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or through the
    /// environment) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref server) = args.server {
            self.server.base_url = server.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }
        if let Some(ref state_dir) = args.state_dir {
            self.storage.state_dir = Some(state_dir.clone());
        }
    }

    /// Check values that would otherwise fail later in confusing ways.
    pub fn validate(&self) -> Result<()> {
        if !self.server.base_url.starts_with("http://")
            && !self.server.base_url.starts_with("https://")
        {
            bail!("Server URL must start with 'http://' or 'https://'");
        }
        if self.server.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.server.retries > MAX_RETRIES {
            bail!("Retries must be at most {}", MAX_RETRIES);
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.metrics.baseline_co2) || !positive(self.metrics.baseline_cost) {
            bail!("Metric baselines must be positive");
        }
        if self.history.display_limit == 0 || self.history.export_limit == 0 {
            bail!("History limits must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:5000");
        assert_eq!(config.metrics.baseline_co2, 10.0);
        assert_eq!(config.history.display_limit, 3);
        assert_eq!(config.history.export_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
base_url = "https://ecopack.example.com"
timeout_seconds = 5

[metrics]
baseline_co2 = 8.0

[history]
display_limit = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.base_url, "https://ecopack.example.com");
        assert_eq!(config.server.timeout_seconds, 5);
        assert_eq!(config.server.retries, 2);
        assert_eq!(config.metrics.baseline_co2, 8.0);
        assert_eq!(config.metrics.baseline_cost, 10.0);
        assert_eq!(config.history.display_limit, 5);
        assert_eq!(config.history.export_limit, 10);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.metrics.baseline_cost = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.base_url = "localhost:5000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.history.display_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bounds_retries() {
        let mut config = Config::default();
        config.server.retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.server.retries = 60;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Retries must be at most 10"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[storage]\nstate_dir = \"/tmp/ecopack-state\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.storage.effective_state_dir(),
            PathBuf::from("/tmp/ecopack-state")
        );
    }

    #[test]
    fn test_merge_with_args() {
        let args = crate::cli::Args {
            command: None,
            config: None,
            server: Some("https://override.example.com".to_string()),
            timeout: Some(7),
            state_dir: None,
            verbose: false,
            quiet: false,
            init_config: false,
        };

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.server.base_url, "https://override.example.com");
        assert_eq!(config.server.timeout_seconds, 7);
        assert_eq!(config.server.retries, 2);
        assert!(config.storage.state_dir.is_none());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[metrics]"));
        assert!(toml_str.contains("[history]"));
    }
}
