//! Config file loading
//!
//! The binary reads one file holding the target, the interval settings, the
//! checker timeout and the notifier selection. YAML is the default format;
//! files ending in `.json` are read as JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, IntervalSettings, NotifierConfig};

/// Config file name used when none is given
pub const DEFAULT_CONFIG_NAME: &str = "config.yml";

/// Top-level config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint to probe
    #[serde(alias = "targeturi")]
    pub target_uri: String,
    #[serde(default)]
    pub alert: IntervalSettings,
    #[serde(default)]
    pub checker: CheckerSettings,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Health probe settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl CheckerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

impl Config {
    /// Create a config for `target_uri` with default settings
    pub fn new(target_uri: impl Into<String>) -> Self {
        Self {
            target_uri: target_uri.into(),
            alert: IntervalSettings::default(),
            checker: CheckerSettings::default(),
            notifier: NotifierConfig::default(),
        }
    }

    /// Read, parse and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = match Format::from_path(path) {
            Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        }
        .map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            target_uri = %config.target_uri,
            notifier = config.notifier.kind(),
            "Loaded config"
        );

        Ok(config)
    }

    /// Write the config back out, in the format implied by the extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |reason: String| ConfigError::Write {
            path: path.to_path_buf(),
            reason,
        };

        let contents = match Format::from_path(path) {
            Format::Yaml => serde_yaml::to_string(self).map_err(|e| write_err(e.to_string()))?,
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?
            }
        };

        std::fs::write(path, contents).map_err(|e| write_err(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_uri.trim().is_empty() {
            return Err(ConfigError::MissingField("target_uri"));
        }
        self.alert.validate()?;
        if self.checker.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "checker.timeout_secs",
                reason: "must be larger than 0".to_string(),
            });
        }
        self.notifier.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yml",
            r#"
target_uri: http://127.0.0.1:9000/health
alert:
  check_interval: 2
  alert_interval: 30
notifier:
  type: log
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.target_uri, "http://127.0.0.1:9000/health");
        assert_eq!(config.alert.check_interval, 2);
        assert_eq!(config.alert.alert_interval, 30);
        assert_eq!(config.checker, CheckerSettings::default());
        assert_eq!(config.notifier, NotifierConfig::Log);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = write_config(".yaml", "targeturi: localhost:8080\n");

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.target_uri, "localhost:8080");
        assert_eq!(config.alert, IntervalSettings::default());
        assert_eq!(config.checker.timeout(), Duration::from_secs(5));
        assert_eq!(config.notifier, NotifierConfig::Stdout);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(
            ".json",
            r#"{
                "target_uri": "https://example.com",
                "alert": { "check_interval": 15 },
                "notifier": { "type": "webhook", "url": "https://hooks.example.com/x" }
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.alert.check_interval, 15);
        assert_eq!(config.alert.alert_interval, 60);
        assert_eq!(config.notifier.kind(), "webhook");
    }

    #[test]
    fn test_invalid_intervals_rejected() {
        let file = write_config(
            ".yml",
            "target_uri: localhost:8080\nalert:\n  check_interval: 0\n",
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidCheckInterval)
        ));

        let file = write_config(
            ".yml",
            "target_uri: localhost:8080\nalert:\n  alert_interval: -1\n",
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::NegativeAlertInterval)
        ));
    }

    #[test]
    fn test_missing_target_rejected() {
        let file = write_config(".yml", "target_uri: \"\"\n");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::MissingField("target_uri"))
        ));
    }

    #[test]
    fn test_unknown_notifier_is_parse_error() {
        let file = write_config(
            ".yml",
            "target_uri: localhost:8080\nnotifier:\n  type: carrier_pigeon\n",
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join(DEFAULT_CONFIG_NAME));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerter.json");

        let mut config = Config::new("http://10.0.0.5/healthz");
        config.alert.alert_interval = 0;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
