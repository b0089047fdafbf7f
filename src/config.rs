//! Scheduler configuration, loaded from TOML.
//!
//! ```toml
//! log_filter = "debug"
//!
//! [solver]
//! deadline_secs = 10
//! lcv_slot_aware = true
//!
//! [server]
//! bind = "0.0.0.0:8080"
//! ```
//!
//! Every key is optional; missing ones fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "SCHEDULER_CONFIG";

const DEFAULT_DEADLINE_SECS: u64 = 30;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub solver: SolverSettings,
    pub server: ServerSettings,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Wall-clock budget for one search when the request does not name one.
    pub deadline_secs: u64,
    /// Pass slot data to the LCV conflict count.
    pub lcv_slot_aware: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            deadline_secs: DEFAULT_DEADLINE_SECS,
            lcv_slot_aware: true,
        }
    }
}

impl SolverSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Loads the file named by `SCHEDULER_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.deadline_secs == 0 {
            return Err(ConfigError::Invalid(
                "solver.deadline_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.bind.is_empty() {
            return Err(ConfigError::Invalid("server.bind must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config.solver.deadline(), Duration::from_secs(30));
        assert!(config.solver.lcv_slot_aware);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            log_filter = "trace"

            [solver]
            lcv_slot_aware = false
            "#,
        )
        .unwrap();
        assert_eq!(config.solver.deadline_secs, 30);
        assert!(!config.solver.lcv_slot_aware);
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let err = SchedulerConfig::from_toml_str("[solver]\ndeadline_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = SchedulerConfig::from_toml_str("[solver\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
