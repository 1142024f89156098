//! # Configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `MOMENTUM_*` environment variables. CLI flags are applied last by the
//! caller.
//!
//! ```toml
//! database = "momentum.redb"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! cors_origins = "https://downloads.example.com"
//!
//! [log]
//! format = "json"
//! filter = "momentum=debug"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default tracing filter when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "momentum=info,tower_http=debug";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated allowed origins, or `*` for all. Unset means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    pub filter: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: PathBuf,
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("momentum.redb"),
            server: ServerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with `path` when given, overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay `MOMENTUM_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("MOMENTUM_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(host) = lookup("MOMENTUM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MOMENTUM_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                var: "MOMENTUM_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(origins) = lookup("MOMENTUM_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
        if let Some(format) = lookup("MOMENTUM_LOG_FORMAT") {
            self.log.format = LogFormat::from_name(&format).ok_or(ConfigError::Env {
                var: "MOMENTUM_LOG_FORMAT",
                value: format.clone(),
            })?;
        }
        if let Some(filter) = lookup("MOMENTUM_LOG_FILTER") {
            self.log.filter = Some(filter);
        }
        Ok(())
    }

    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database, PathBuf::from("momentum.redb"));
        assert_eq!(config.server.addr(), "127.0.0.1:8080");
        assert_eq!(config.log.format, LogFormat::Text);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [log]
            format = "json"
            "#,
        )
        .expect("parse");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.database, PathBuf::from("momentum.redb"));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("databse = \"x.redb\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[server]\nthreads = 4"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = AppConfig::from_toml_str("database = \"file.redb\"").expect("parse");
        config
            .apply_env(env(&[
                ("MOMENTUM_DATABASE", "env.redb"),
                ("MOMENTUM_PORT", "9100"),
                ("MOMENTUM_CORS_ORIGINS", "*"),
                ("MOMENTUM_LOG_FILTER", "momentum=trace"),
            ]))
            .expect("env");
        assert_eq!(config.database, PathBuf::from("env.redb"));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.cors_origins.as_deref(), Some("*"));
        assert_eq!(config.log_filter(), "momentum=trace");
    }

    #[test]
    fn bad_env_values_rejected() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("MOMENTUM_PORT", "eighty")])),
            Err(ConfigError::Env { var: "MOMENTUM_PORT", .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[("MOMENTUM_LOG_FORMAT", "yaml")])),
            Err(ConfigError::Env { var: "MOMENTUM_LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn missing_file_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = AppConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
