use super::serde_helpers;
use crate::domain::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration of a [`HecLogger`](super::HecLogger).
///
/// Level and sourcetype stay mutable at runtime through the logger facade;
/// changes take effect on the next logged event only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// HEC endpoint, e.g. `https://splunk.example.com:8088/services/collector/event`.
    pub endpoint: String,
    /// HEC token, carried as `Authorization: Splunk <token>`.
    pub token: String,
    /// Whether the endpoint is expected to speak TLS.
    pub tls: bool,
    /// Severity stamped on outgoing events; `Off` suppresses all sends.
    pub level: Severity,
    /// Sourcetype tag attached to every event.
    pub sourcetype: String,
    /// Whether events are queued and flushed in batches.
    pub batching: bool,
    /// Queue length that triggers an immediate flush.
    pub batch_size: usize,
    /// Longest time events wait in the queue before a timed flush.
    #[serde(rename = "batch_interval_ms", with = "serde_helpers")]
    pub batch_interval: Duration,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost:8088/services/collector/event".to_string(),
            token: String::new(),
            tls: true,
            level: Severity::Info,
            sourcetype: "Mobile Application".to_string(),
            batching: false,
            batch_size: 100,
            batch_interval: Duration::from_millis(500),
        }
    }
}

impl LoggerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.batch_interval.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "batch_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "https://splunk.example.com:8088/services/collector/event"
token = "secret"
level = "WARNING"
sourcetype = "backend"
batching = true
batch_size = 3
batch_interval_ms = 250
"#
        )
        .unwrap();

        let config = LoggerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.level, Severity::Warning);
        assert_eq!(config.sourcetype, "backend");
        assert!(config.batching);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.batch_interval, Duration::from_millis(250));
        assert!(config.tls); // default kept for omitted fields
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = LoggerConfig {
            endpoint: "not a url".to_string(),
            ..LoggerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_degenerate_batching_knobs() {
        let config = LoggerConfig {
            batch_size: 0,
            ..LoggerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));

        let config = LoggerConfig {
            batch_interval: Duration::ZERO,
            ..LoggerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}
