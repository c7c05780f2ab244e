//! Configuration file
//!
//! ```json
//! {
//!   "database": "./app.sqlite",
//!   "tables": ["group", "user"],
//!   "backup_path": "./backup.json",
//!   "busy_timeout_ms": 5000,
//!   "log_level": "info"
//! }
//! ```
//!
//! `database` and `tables` are required; everything else has a default.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "./relsnap.json";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelsnapConfig {
    /// SQLite database file (required)
    pub database: PathBuf,

    /// Tables to back up (required, non-empty)
    pub tables: Vec<String>,

    /// Snapshot file used when a command names none (default `backup.json`)
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,

    /// How long to wait on a locked database (default 5000)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Minimum log severity (default `info`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("backup.json")
}
fn default_busy_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl RelsnapConfig {
    /// Configuration with defaults for everything optional
    pub fn new(database: impl Into<PathBuf>, tables: &[&str]) -> Self {
        Self {
            database: database.into(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
            backup_path: default_backup_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: RelsnapConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".into()));
        }

        if self.tables.is_empty() {
            return Err(ConfigError::Invalid("tables must list at least one table".into()));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.trim().is_empty() {
                return Err(ConfigError::Invalid("table names must not be empty".into()));
            }
            // SQLite compares identifiers case-insensitively
            if !seen.insert(table.to_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!("table '{}' listed twice", table)));
            }
            if table.to_ascii_lowercase().starts_with("sqlite_") {
                return Err(ConfigError::Invalid(format!(
                    "table '{}' is internal to SQLite",
                    table
                )));
            }
        }

        self.severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
