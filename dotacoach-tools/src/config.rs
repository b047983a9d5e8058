//! Monitor configuration file.
//!
//! ```yaml
//! endpoint: ws://192.168.0.12:8080/ws
//! fps: 10
//! retry_secs: 3
//! quiet: false
//! event_log_size: 8
//! ```
//!
//! Every key is optional; command line flags take precedence.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub endpoint: Option<String>,
    pub fps: Option<u64>,
    pub retry_secs: Option<u64>,
    pub quiet: Option<bool>,
    pub event_log_size: Option<usize>,
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MonitorConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        MonitorConfig::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<MonitorConfig, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(MonitorConfig::default());
        }
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let cfg = MonitorConfig::parse(
            "endpoint: ws://192.168.0.12:8080/ws\nfps: 4\nretry_secs: 3\nquiet: true\nevent_log_size: 8\n",
        )
        .unwrap();
        assert_eq!(cfg.endpoint.as_deref(), Some("ws://192.168.0.12:8080/ws"));
        assert_eq!(cfg.fps, Some(4));
        assert_eq!(cfg.retry_secs, Some(3));
        assert_eq!(cfg.quiet, Some(true));
        assert_eq!(cfg.event_log_size, Some(8));
    }

    #[test]
    fn test_parse_partial_and_empty() {
        let cfg = MonitorConfig::parse("fps: 20\n").unwrap();
        assert_eq!(cfg.fps, Some(20));
        assert_eq!(cfg.endpoint, None);
        assert_eq!(MonitorConfig::parse("").unwrap(), MonitorConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(MonitorConfig::parse("colour: red\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MonitorConfig::load("/nonexistent/coach.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
