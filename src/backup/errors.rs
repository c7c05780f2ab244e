//! Backup coordinator error types
//!
//! Coordinator errors follow one model:
//! - Structured error codes in RELSNAP_CATEGORY format
//! - One severity, FATAL: the operation stopped and nothing was committed
//! - Optional table/column/row context
//! - The component error that caused it, as `source`

use std::fmt;
use std::io;
use std::path::Path;

use crate::catalog::CatalogError;
use crate::order::OrderError;
use crate::restore::RestoreError;
use crate::snapshot::{DocumentError, SourceError};

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation was abandoned; the database is as it was before
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Backup error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupErrorCode {
    /// Live schema could not be described
    SchemaUnavailable,
    /// Tables reference each other in a cycle
    CircularDependency,
    /// Rows of one table reference each other in a cycle
    CircularRowReference,
    /// Snapshot is not JSON or carries an unsupported version
    UnsupportedFormat,
    /// Snapshot does not fit the live schema
    SchemaMismatch,
    /// File or database access failed
    Io,
    /// A foreign key points at a row that does not exist
    ReferentialInvariantViolation,
}

impl BackupErrorCode {
    /// Returns the string form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupErrorCode::SchemaUnavailable => "RELSNAP_SCHEMA_UNAVAILABLE",
            BackupErrorCode::CircularDependency => "RELSNAP_CIRCULAR_DEPENDENCY",
            BackupErrorCode::CircularRowReference => "RELSNAP_CIRCULAR_ROW_REFERENCE",
            BackupErrorCode::UnsupportedFormat => "RELSNAP_UNSUPPORTED_FORMAT",
            BackupErrorCode::SchemaMismatch => "RELSNAP_SCHEMA_MISMATCH",
            BackupErrorCode::Io => "RELSNAP_IO",
            BackupErrorCode::ReferentialInvariantViolation => "RELSNAP_REFERENTIAL_VIOLATION",
        }
    }

    /// Returns the severity level for this error code
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for BackupErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where in the data a failure was found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub table: Option<String>,
    pub column: Option<String>,
    /// Position of the row in its snapshot table
    pub row: Option<usize>,
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Backup error with full context
#[derive(Debug)]
pub struct BackupError {
    code: BackupErrorCode,
    message: String,
    context: ErrorContext,
    source: Option<BoxedSource>,
}

impl BackupError {
    fn new(code: BackupErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn with_table(mut self, table: Option<&str>) -> Self {
        self.context.table = table.map(str::to_string);
        self
    }

    /// Creates an I/O error at a specific path
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::new(BackupErrorCode::Io, format!("I/O error at {}", path.display()))
            .with_source(source)
    }

    /// Creates an I/O error from a database failure outside any table
    pub fn database(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::new(BackupErrorCode::Io, message).with_source(source)
    }

    /// Returns the error code
    pub fn code(&self) -> BackupErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Returns the severity of this error
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code,
            self.message
        )?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

impl From<CatalogError> for BackupError {
    fn from(err: CatalogError) -> Self {
        let table = err.table().to_string();
        BackupError::new(BackupErrorCode::SchemaUnavailable, "cannot describe live schema")
            .with_table(Some(&table))
            .with_source(err)
    }
}

impl From<OrderError> for BackupError {
    fn from(err: OrderError) -> Self {
        BackupError::new(BackupErrorCode::CircularDependency, err.to_string())
    }
}

impl From<SourceError> for BackupError {
    fn from(err: SourceError) -> Self {
        let mut backup = BackupError::new(BackupErrorCode::Io, "database access failed")
            .with_table(Some(err.table()));
        backup.context.column = err.column().map(str::to_string);
        backup.with_source(err)
    }
}

impl From<DocumentError> for BackupError {
    fn from(err: DocumentError) -> Self {
        let (code, message) = match &err {
            DocumentError::Serialize(_) => (BackupErrorCode::Io, "cannot encode snapshot"),
            DocumentError::Shape(_) => (
                BackupErrorCode::SchemaMismatch,
                "snapshot does not have the expected shape",
            ),
            _ => (BackupErrorCode::UnsupportedFormat, "snapshot cannot be read"),
        };
        BackupError::new(code, message).with_source(err)
    }
}

impl From<RestoreError> for BackupError {
    fn from(err: RestoreError) -> Self {
        let (code, message) = match err {
            RestoreError::CircularDependency(order) => return BackupError::from(order),
            RestoreError::Sink(source) => return BackupError::from(source),
            RestoreError::UnsupportedFormat { .. } => {
                (BackupErrorCode::UnsupportedFormat, "snapshot version not supported")
            }
            RestoreError::SchemaMismatch { .. } => {
                (BackupErrorCode::SchemaMismatch, "snapshot does not match live schema")
            }
            RestoreError::CircularRowReference { .. } => {
                (BackupErrorCode::CircularRowReference, "rows cannot be ordered")
            }
            RestoreError::ReferentialInvariantViolation { .. } => (
                BackupErrorCode::ReferentialInvariantViolation,
                "foreign key has no matching row",
            ),
        };

        let column = match &err {
            RestoreError::ReferentialInvariantViolation { columns, .. } => Some(columns.join(", ")),
            _ => err.column().map(str::to_string),
        };
        let context = ErrorContext {
            table: err.table().map(str::to_string),
            column,
            row: err.row(),
        };

        let mut backup = BackupError::new(code, message).with_source(err);
        backup.context = context;
        backup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BackupErrorCode::SchemaUnavailable.as_str(),
            "RELSNAP_SCHEMA_UNAVAILABLE"
        );
        assert_eq!(BackupErrorCode::Io.as_str(), "RELSNAP_IO");
        assert_eq!(
            BackupErrorCode::ReferentialInvariantViolation.as_str(),
            "RELSNAP_REFERENTIAL_VIOLATION"
        );
    }

    #[test]
    fn test_all_errors_are_fatal_severity() {
        let codes = [
            BackupErrorCode::SchemaUnavailable,
            BackupErrorCode::CircularDependency,
            BackupErrorCode::CircularRowReference,
            BackupErrorCode::UnsupportedFormat,
            BackupErrorCode::SchemaMismatch,
            BackupErrorCode::Io,
            BackupErrorCode::ReferentialInvariantViolation,
        ];

        for code in codes {
            assert_eq!(code.severity(), Severity::Fatal);
        }
    }

    #[test]
    fn test_display_contains_code_message_and_cause() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = BackupError::io_error_at_path(Path::new("/tmp/backup.json"), io_err);
        let display = err.to_string();

        assert!(display.starts_with("[FATAL] RELSNAP_IO: "));
        assert!(display.contains("/tmp/backup.json"));
        assert!(display.contains("caused by: no such file"));
    }

    #[test]
    fn test_violation_keeps_context() {
        let err = BackupError::from(RestoreError::ReferentialInvariantViolation {
            table: "user".into(),
            row: 3,
            columns: vec!["groupId".into()],
            referenced_table: "group".into(),
            value: "99".into(),
        });

        assert_eq!(err.code(), BackupErrorCode::ReferentialInvariantViolation);
        assert_eq!(err.context().table.as_deref(), Some("user"));
        assert_eq!(err.context().column.as_deref(), Some("groupId"));
        assert_eq!(err.context().row, Some(3));
    }

    #[test]
    fn test_document_errors_split_by_kind() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            BackupError::from(DocumentError::Malformed(malformed)).code(),
            BackupErrorCode::UnsupportedFormat
        );

        let shape = serde_json::from_str::<Vec<u8>>("{}").unwrap_err();
        assert_eq!(
            BackupError::from(DocumentError::Shape(shape)).code(),
            BackupErrorCode::SchemaMismatch
        );
    }

    #[test]
    fn test_restore_cycle_maps_to_circular_dependency() {
        let err = BackupError::from(RestoreError::CircularDependency(
            OrderError::CircularDependency(vec!["a".into(), "b".into()]),
        ));
        assert_eq!(err.code(), BackupErrorCode::CircularDependency);
        assert!(err.message().contains("a, b"));
    }
}
