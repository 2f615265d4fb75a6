//! Configuration for prayer-guard
//!
//! Values come from built-in defaults, an optional TOML file and
//! `PRAYER_GUARD__*` environment variables, in that order of precedence.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides, e.g. `PRAYER_GUARD__SPAM__BLOCK_THRESHOLD=90`
pub const ENV_PREFIX: &str = "PRAYER_GUARD";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub spam: SpamConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Thresholds and weights for the prayer commitment spam scorer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Score at or above which the commitment is blocked
    pub block_threshold: u32,
    /// Score at or above which the user is warned
    pub warn_threshold: u32,

    /// Accounts younger than this (in days) count as new
    pub new_account_days: f64,
    pub new_account_points: u32,

    /// Age assumed when the account creation time cannot be read
    pub missing_account_age_days: f64,

    pub recent_window_secs: u64,
    pub recent_limit: u32,
    pub recent_points: u32,

    pub rapid_fire_window_secs: u64,
    pub rapid_fire_limit: u32,
    pub rapid_fire_points: u32,

    /// Minimum history before the confirmation ratio is judged
    pub min_commitments_for_ratio: u32,
    /// Confirmation percentage below which the ratio penalty applies
    pub min_confirmation_ratio: f64,
    pub low_confirmation_points: u32,

    /// Upper bound on commitments read per check (None reads everything)
    pub history_limit: Option<u32>,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            block_threshold: 80,
            warn_threshold: 50,
            new_account_days: 1.0,
            new_account_points: 30,
            missing_account_age_days: 999.0,
            recent_window_secs: 5 * 60,
            recent_limit: 5,
            recent_points: 40,
            rapid_fire_window_secs: 10,
            rapid_fire_limit: 3,
            rapid_fire_points: 60,
            min_commitments_for_ratio: 5,
            min_confirmation_ratio: 20.0,
            low_confirmation_points: 50,
            history_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://prayer-guard.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())
            .map_err(|e| GuardError::Config(e.to_string()))?;

        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: Config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| GuardError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let spam = &self.spam;

        if spam.warn_threshold > spam.block_threshold {
            return Err(GuardError::Config(format!(
                "warn_threshold ({}) must not exceed block_threshold ({})",
                spam.warn_threshold, spam.block_threshold
            )));
        }

        if spam.recent_window_secs == 0 || spam.rapid_fire_window_secs == 0 {
            return Err(GuardError::Config(
                "Spam time windows must be non-zero".to_string(),
            ));
        }

        if self.storage.database_url.trim().is_empty() {
            return Err(GuardError::Config("database_url is empty".to_string()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spam: SpamConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.spam.block_threshold, 80);
        assert_eq!(config.spam.warn_threshold, 50);
        assert!(config.spam.history_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[spam]
block_threshold = 90

[logging]
format = "json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.spam.block_threshold, 90);
        // Unset fields keep their defaults
        assert_eq!(config.spam.rapid_fire_points, 60);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.spam.warn_threshold = 90;
        assert!(matches!(config.validate(), Err(GuardError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.spam.rapid_fire_window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\ndatabase_url = \"sqlite::memory:\"\n\n[spam]\nhistory_limit = 500"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.storage.database_url, "sqlite::memory:");
        assert_eq!(config.spam.history_limit, Some(500));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/prayer-guard.toml");
        assert!(matches!(result, Err(GuardError::Config(_))));
    }
}
