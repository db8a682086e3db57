//! Configuration settings for the Samarth Q&A service.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub datasets: DatasetsConfig,
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("samarth.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("samarth/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".samarth/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        for (name, dataset) in [
            ("agriculture", &self.datasets.agriculture),
            ("rainfall", &self.datasets.rainfall),
        ] {
            if dataset.local_sample.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "datasets.{name}.local_sample"
                ))
                .into());
            }
        }

        if self.analytics.default_top_m == 0 {
            return Err(ConfigError::Invalid("default_top_m must be > 0".to_string()).into());
        }
        if self.analytics.trend_flat_epsilon < 0.0 {
            return Err(
                ConfigError::Invalid("trend_flat_epsilon must be >= 0".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Expand the dataset cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.datasets.cache_dir);
        PathBuf::from(expanded.as_ref())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP port to bind.
    pub http_port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Allowed origins for CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8000,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Dataset sources configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    /// Directory for raw remote snapshots.
    pub cache_dir: String,
    /// District-level crop production records.
    pub agriculture: DatasetSource,
    /// State-level annual rainfall records.
    pub rainfall: DatasetSource,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            cache_dir: "data/cache".to_string(),
            agriculture: DatasetSource {
                local_sample: "data/agriculture.csv".to_string(),
                resource_id: String::new(),
                source_url: "https://data.gov.in".to_string(),
            },
            rainfall: DatasetSource {
                local_sample: "data/rainfall.csv".to_string(),
                resource_id: String::new(),
                source_url: "https://data.gov.in".to_string(),
            },
        }
    }
}

/// A single dataset source.
///
/// `resource_id` enables remote fetch from the data.gov.in datastore when
/// the `DATAGOV_API_KEY` environment variable is set; `local_sample` is
/// the offline fallback and the default source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSource {
    /// Path to the bundled CSV sample.
    pub local_sample: String,
    /// data.gov.in datastore resource id.
    pub resource_id: String,
    /// Human-facing source URL used in citations.
    pub source_url: String,
}

/// Defaults for the Analytics Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Default number of top crops per state in comparisons.
    pub default_top_m: usize,
    /// Default year window for rainfall/crop comparisons.
    pub compare_lookback_years: usize,
    /// Default year window for production trends.
    pub trend_lookback_years: usize,
    /// Default year window for policy comparisons.
    pub policy_lookback_years: usize,
    /// Relative slope (fraction of mean production per year) below which
    /// a trend is reported as flat.
    pub trend_flat_epsilon: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_top_m: 3,
            compare_lookback_years: 5,
            trend_lookback_years: 10,
            policy_lookback_years: 5,
            trend_flat_epsilon: 0.01,
        }
    }
}
