//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1 and is printed as
//! `CODE: message`.

use std::error::Error as _;
use std::fmt;
use std::io;
use std::path::Path;

use crate::backup::{BackupError, BackupErrorCode};
use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Snapshot file to restore does not exist
    BackupNotFound,
    /// Export or restore failed
    Backup(BackupErrorCode),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RELSNAP_CLI_CONFIG_ERROR",
            Self::IoError => "RELSNAP_CLI_IO_ERROR",
            Self::BackupNotFound => "RELSNAP_CLI_BACKUP_NOT_FOUND",
            Self::Backup(code) => code.as_str(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Snapshot file missing
    pub fn backup_not_found(path: &Path) -> Self {
        Self::new(
            CliErrorCode::BackupNotFound,
            format!("backup file not found: {}", path.display()),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<BackupError> for CliError {
    fn from(e: BackupError) -> Self {
        let message = match e.source() {
            Some(cause) => format!("{} (caused by: {})", e.message(), cause),
            None => e.message().to_string(),
        };
        Self::new(CliErrorCode::Backup(e.code()), message)
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
