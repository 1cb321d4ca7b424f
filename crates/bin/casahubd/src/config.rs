//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `casahub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistent storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Shared hardware settings.
    pub hardware: HardwareConfig,
    /// Plugin toggles.
    pub plugins: PluginsConfig,
}

/// Storage directory configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the JSON storage files.
    pub dir: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Shared hardware resource configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Interval of the shared plugin timer, in seconds.
    pub timer_interval_secs: u64,
}

/// Per-plugin toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Enable the virtual demo plugin.
    pub virtual_enabled: bool,
}

impl Config {
    /// Load configuration from `casahub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("casahub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CASAHUB_STORAGE_DIR") {
            self.storage.dir = val;
        }
        if let Ok(val) = std::env::var("CASAHUB_TIMER_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.hardware.timer_interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("CASAHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.dir.is_empty() {
            return Err(ConfigError::Validation(
                "storage dir must not be empty".to_string(),
            ));
        }
        if self.hardware.timer_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "timer interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "casahub-data".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "casahubd=info,casahub=info".to_string(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            timer_interval_secs: 15,
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.dir, "casahub-data");
        assert_eq!(config.hardware.timer_interval_secs, 15);
        assert!(config.plugins.virtual_enabled);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.hardware.timer_interval_secs, 15);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [storage]
            dir = '/var/lib/casahub'

            [logging]
            filter = 'debug'

            [hardware]
            timer_interval_secs = 30

            [plugins]
            virtual_enabled = false
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.dir, "/var/lib/casahub");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.hardware.timer_interval_secs, 30);
        assert!(!config.plugins.virtual_enabled);
    }

    #[test]
    fn should_reject_zero_timer_interval() {
        let config = Config {
            hardware: HardwareConfig {
                timer_interval_secs: 0,
            },
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
