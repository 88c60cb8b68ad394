//! Configuration management for the image host
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

use crate::routing::ResponseFormat;

/// Configuration loading failure
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max request body size in bytes (default: 10MiB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

/// Response formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingConfig {
    /// Format used when neither the path nor `Accept` picks one
    #[serde(default = "default_format")]
    pub default_format: ResponseFormat,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_format() -> ResponseFormat {
    ResponseFormat::Json
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            timeout_secs: default_timeout_secs(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Formatting configuration
    #[serde(default)]
    pub formatting: FormattingConfig,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            formatting: FormattingConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - IMAGEHOST_CONFIG_FILE: optional path to TOML config file
    /// - IMAGEHOST_BIND_ADDRESS: server bind address (default: 0.0.0.0:8080)
    /// - IMAGEHOST_TIMEOUT_SECS: request timeout (default: 30)
    /// - IMAGEHOST_MAX_BODY_SIZE: max request size in bytes (default: 10MiB)
    /// - IMAGEHOST_DEFAULT_FORMAT: json|xml|html (default: json)
    /// - IMAGEHOST_LOG_LEVEL: log level (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("IMAGEHOST_CONFIG_FILE") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(addr) = lookup("IMAGEHOST_BIND_ADDRESS") {
            config.server.bind_address = parse_env("IMAGEHOST_BIND_ADDRESS", &addr)?;
        }

        if let Some(timeout) = lookup("IMAGEHOST_TIMEOUT_SECS") {
            config.server.timeout_secs = parse_env("IMAGEHOST_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(size) = lookup("IMAGEHOST_MAX_BODY_SIZE") {
            config.server.max_body_size = parse_env("IMAGEHOST_MAX_BODY_SIZE", &size)?;
        }

        if let Some(format) = lookup("IMAGEHOST_DEFAULT_FORMAT") {
            config.formatting.default_format = parse_env("IMAGEHOST_DEFAULT_FORMAT", &format)?;
        }

        if let Some(level) = lookup("IMAGEHOST_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

fn parse_env<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.bind_address.port(), 8080);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.formatting.default_format, ResponseFormat::Json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("IMAGEHOST_BIND_ADDRESS", "127.0.0.1:9000"),
            ("IMAGEHOST_DEFAULT_FORMAT", "xml"),
            ("IMAGEHOST_LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.server.bind_address.to_string(), "127.0.0.1:9000");
        assert_eq!(config.formatting.default_format, ResponseFormat::Xml);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_env_value() {
        let err = Config::from_lookup(lookup(&[("IMAGEHOST_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "IMAGEHOST_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            log_level = "warn"

            [formatting]
            default_format = "html"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.formatting.default_format, ResponseFormat::Html);
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
    }
}
