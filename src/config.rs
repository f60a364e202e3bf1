//! Configuration for codemend response handling.

use codemend_recover::RepairConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CodemendError, Result};
use crate::modes::TaskOptions;

/// Default tracing filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "codemend=info,codemend_recover=warn";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fuzzy key matching thresholds for the repair engine.
    pub repair: RepairConfig,
    /// Tracing filter directive, e.g. `codemend=debug`.
    pub log_filter: String,
    /// Options applied when the CLI is not given explicit flags.
    pub defaults: TaskOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repair: RepairConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            defaults: TaskOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| CodemendError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CodemendError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates repair thresholds and the log filter.
    ///
    /// # Errors
    ///
    /// Returns [`CodemendError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.repair
            .validate()
            .map_err(|e| CodemendError::Config(format!("repair: {e}")))?;
        if self.log_filter.trim().is_empty() {
            return Err(CodemendError::Config("log_filter must not be empty".into()));
        }
        Ok(())
    }

    /// Load `path` if it exists, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// fails validation.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path, `config_dir()/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}

/// Codemend config directory.
///
/// Resolves to `dirs::config_dir()/codemend/` by default. Override with
/// the `CODEMEND_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CODEMEND_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("codemend"))
        .unwrap_or_else(|| PathBuf::from("/tmp/codemend-config"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.repair, RepairConfig::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.repair.max_length_diff = 1;
        config.log_filter = "codemend=debug".into();
        config.defaults.include_reasoning = true;

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[repair]\nlong_key_max_distance = 4\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.repair.long_key_max_distance, 4);
        assert_eq!(config.repair.short_key_max_distance, 2);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.defaults.multiple);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = AppConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(CodemendError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = AppConfig::from_file(&path);
        assert!(matches!(result, Err(CodemendError::Config(_))));
    }

    #[test]
    fn from_file_rejects_invalid_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[repair]\nshort_key_len = 0\n").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("short_key_len"));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_or_default_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_filter = \"codemend=trace\"\n").unwrap();

        let config = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(config.log_filter, "codemend=trace");
    }

    #[test]
    fn load_or_default_surfaces_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[repair]\nshort_key_len = 0\n").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn default_path_ends_in_config_toml() {
        let path = AppConfig::default_config_path();
        assert!(path.ends_with("config.toml"));
        assert_eq!(path.parent(), Some(config_dir().as_path()));
    }

    #[test]
    fn empty_log_filter_rejected() {
        let config = AppConfig {
            log_filter: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
