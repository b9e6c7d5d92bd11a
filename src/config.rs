//! Service configuration
//!
//! Every field has a default, so an empty TOML file (or none at all) yields a
//! working configuration. Command-line flags override file values.
//!
//! # Example TOML
//! ```toml
//! [engine]
//! significance_level = 0.05
//! confidence_level = 0.95
//! min_sample_size = 2
//!
//! [cache]
//! ttl_secs = 300
//!
//! [server]
//! listen = "0.0.0.0:8080"
//!
//! [daily]
//! window_days = 30
//! source = "cron"
//!
//! [store]
//! path = "results.json"
//! ```

use crate::error::{CompareError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Statistical settings of the comparison engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// p-value above which a difference is reported as insignificant
    ///
    /// - 0.05 (default): 95% confidence
    /// - 0.01: stricter, fewer false positives
    pub significance_level: f64,

    /// Coverage requested for the confidence interval around each median
    pub confidence_level: f64,

    /// Runs needed on each side before ranges and significance are reported
    pub min_sample_size: usize,

    /// Fail with `InsufficientSamples` instead of skipping the test
    pub strict_samples: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            confidence_level: 0.95,
            min_sample_size: 2,
            strict_samples: false,
        }
    }
}

impl EngineConfig {
    /// Stricter settings for release gating
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            confidence_level: 0.99,
            min_sample_size: 5,
            strict_samples: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(CompareError::invalid_input(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(CompareError::invalid_input(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.min_sample_size < 1 {
            return Err(CompareError::invalid_input(
                "min_sample_size must be >= 1, got 0",
            ));
        }
        Ok(())
    }
}

/// Comparison cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached comparison; 0 disables caching
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Daily summary window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    pub window_days: u32,
    /// Run source that feeds the daily charts
    pub source: String,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            source: "cron".to_string(),
        }
    }
}

/// Where runs are read from: a local dataset file or an upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    pub upstream_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            upstream_url: None,
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Full service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub daily: DailyConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or fails
    /// [`Config::validate`].
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if self.daily.window_days == 0 {
            return Err(CompareError::invalid_input("daily.window_days must be >= 1"));
        }
        if self.store.path.is_some() && self.store.upstream_url.is_some() {
            return Err(CompareError::invalid_input(
                "store.path and store.upstream_url are mutually exclusive",
            ));
        }
        if self.store.timeout_secs == 0 {
            return Err(CompareError::invalid_input("store.timeout_secs must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.significance_level, 0.05);
        assert_eq!(config.engine.confidence_level, 0.95);
        assert_eq!(config.engine.min_sample_size, 2);
        assert!(!config.engine.strict_samples);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.daily.window_days, 30);
        assert_eq!(config.daily.source, "cron");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_engine_config() {
        let config = EngineConfig::strict();
        assert_eq!(config.significance_level, 0.01);
        assert!(config.strict_samples);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [engine]
            significance_level = 0.1

            [server]
            listen = "0.0.0.0:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.significance_level, 0.1);
        assert_eq!(config.engine.min_sample_size, 2);
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.cache.ttl_secs, 300);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_significance_level() {
        let mut config = EngineConfig::default();
        config.significance_level = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_sample_size() {
        let mut config = EngineConfig::default();
        config.min_sample_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_sources_are_exclusive() {
        let result = Config::from_toml_str(
            r#"
            [store]
            path = "results.json"
            upstream_url = "http://localhost:9090"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_toml_syntax_is_error() {
        assert!(Config::from_toml_str("[engine\n").is_err());
    }
}
