//! Notifier selection
//!
//! The set of notifiers the binary can be configured with is closed: the
//! `type` tag in the config file must name one of the variants below, and an
//! unknown tag fails at load time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::alerts::notifier::{LogNotifier, Notifier, StdNotifier, WebhookNotifier};

fn default_webhook_timeout_secs() -> u64 {
    10
}

/// Notification channel configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Alerts to stderr, recoveries to stdout
    #[default]
    Stdout,
    /// Log through tracing
    Log,
    /// HTTP webhook
    Webhook {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
        #[serde(default = "default_webhook_timeout_secs")]
        timeout_secs: u64,
    },
}

impl NotifierConfig {
    /// Tags accepted in the `type` field
    pub const KINDS: &'static [&'static str] = &["stdout", "log", "webhook"];

    pub fn kind(&self) -> &'static str {
        match self {
            NotifierConfig::Stdout => "stdout",
            NotifierConfig::Log => "log",
            NotifierConfig::Webhook { .. } => "webhook",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            NotifierConfig::Stdout | NotifierConfig::Log => Ok(()),
            NotifierConfig::Webhook {
                url, timeout_secs, ..
            } => {
                if url.trim().is_empty() {
                    return Err(ConfigError::MissingField("notifier.url"));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        field: "notifier.url",
                        reason: format!("{} is not an http(s) URL", url),
                    });
                }
                if *timeout_secs == 0 {
                    return Err(ConfigError::Invalid {
                        field: "notifier.timeout_secs",
                        reason: "must be larger than 0".to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Construct the configured notifier for `target`.
    pub fn build(&self, target: &str) -> Result<Arc<dyn Notifier>, ConfigError> {
        self.validate()?;

        let notifier: Arc<dyn Notifier> = match self {
            NotifierConfig::Stdout => Arc::new(StdNotifier::new()),
            NotifierConfig::Log => Arc::new(LogNotifier::new(target)),
            NotifierConfig::Webhook {
                url,
                headers,
                timeout_secs,
            } => Arc::new(
                WebhookNotifier::new(url.clone())
                    .with_target(target)
                    .with_headers(headers.clone())
                    .with_timeout(Duration::from_secs(*timeout_secs)),
            ),
        };

        Ok(notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_variants() {
        let config: NotifierConfig = serde_yaml::from_str("type: log").unwrap();
        assert_eq!(config, NotifierConfig::Log);

        let config: NotifierConfig = serde_yaml::from_str(
            "type: webhook\nurl: http://hooks.local/alert\nheaders:\n  X-Token: abc\n",
        )
        .unwrap();
        match &config {
            NotifierConfig::Webhook {
                url,
                headers,
                timeout_secs,
            } => {
                assert_eq!(url, "http://hooks.local/alert");
                assert_eq!(headers.get("X-Token").map(String::as_str), Some("abc"));
                assert_eq!(*timeout_secs, 10);
            }
            other => panic!("unexpected notifier: {:?}", other),
        }
        assert_eq!(config.kind(), "webhook");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<NotifierConfig, _> = serde_yaml::from_str("type: pager");
        assert!(result.is_err());

        let result: Result<NotifierConfig, _> = serde_json::from_str(r#"{"type": "naver"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_webhook_validation() {
        let missing = NotifierConfig::Webhook {
            url: " ".to_string(),
            headers: HashMap::new(),
            timeout_secs: 5,
        };
        assert!(matches!(
            missing.validate(),
            Err(ConfigError::MissingField("notifier.url"))
        ));

        let bad_scheme = NotifierConfig::Webhook {
            url: "ftp://hooks.local".to_string(),
            headers: HashMap::new(),
            timeout_secs: 5,
        };
        assert!(matches!(
            bad_scheme.build("svc"),
            Err(ConfigError::Invalid { field: "notifier.url", .. })
        ));

        let zero_timeout = NotifierConfig::Webhook {
            url: "https://hooks.local".to_string(),
            headers: HashMap::new(),
            timeout_secs: 0,
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_kinds_cover_variants() {
        for config in [
            NotifierConfig::Stdout,
            NotifierConfig::Log,
            NotifierConfig::Webhook {
                url: "http://hooks.local".to_string(),
                headers: HashMap::new(),
                timeout_secs: 1,
            },
        ] {
            assert!(NotifierConfig::KINDS.contains(&config.kind()));
            assert!(config.build("svc").is_ok());
        }
    }
}
