//! Client configuration.

use crate::identity::ClientIdentity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where to report and who is reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the collection scripts, ending in `/`
    pub root_url: String,

    /// Application identifier sent with the session report
    pub app_id: String,

    /// Application version sent with the session report
    pub app_version: String,

    /// Per-request timeout for the HTTP transport (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl ClientConfig {
    /// Create a configuration with the default request timeout.
    pub fn new(
        root_url: impl Into<String>,
        app_id: impl Into<String>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            root_url: root_url.into(),
            app_id: app_id.into(),
            app_version: app_version.into(),
            request_timeout_secs: default_timeout_secs(),
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can produce working endpoint URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.root_url.starts_with("http://") || self.root_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "root URL must start with http:// or https://, got '{}'",
                self.root_url
            )));
        }

        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid("app ID must not be empty".to_string()));
        }

        if !self.root_url.ends_with('/') {
            tracing::debug!(
                root_url = %self.root_url,
                "root URL has no trailing slash; endpoint paths are appended verbatim"
            );
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Identity for the given device.
    pub fn identity(&self, device_id: impl Into<String>) -> ClientIdentity {
        ClientIdentity::new(
            self.root_url.clone(),
            self.app_id.clone(),
            self.app_version.clone(),
            device_id,
        )
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Invalid(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid(e) => write!(f, "Invalid config: {e}"),
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_default_timeout() {
        let config = ClientConfig::from_json_str(
            r#"{"root_url":"https://collect.example.org/","app_id":"refraktions","app_version":"2.1"}"#,
        )
        .unwrap();

        assert_eq!(config.app_id, "refraktions");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::new("https://x.org/", "app", "1").validate().is_ok());
        assert!(ClientConfig::new("ftp://x.org/", "app", "1").validate().is_err());
        assert!(ClientConfig::new("https://x.org/", " ", "1").validate().is_err());
        // Missing slash is allowed, only logged
        assert!(ClientConfig::new("https://x.org", "app", "1").validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = ClientConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_identity() {
        let identity = ClientConfig::new("https://x.org/", "app", "1.2").identity("DEV-1");
        assert_eq!(identity.root_url, "https://x.org/");
        assert_eq!(identity.app_version, "1.2");
        assert_eq!(identity.device_id, "DEV-1");
    }
}
