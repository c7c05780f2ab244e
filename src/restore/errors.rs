//! Restore error types
//!
//! Every variant aborts the restore. Errors raised before the first write
//! guarantee the database was never touched; errors raised later rely on
//! the caller rolling back the surrounding transaction.

use thiserror::Error;

use crate::order::OrderError;
use crate::snapshot::SourceError;

/// Result type for restore operations
pub type RestoreResult<T> = Result<T, RestoreError>;

/// Restore failures
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("unsupported snapshot formatVersion {found} (supported: {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },

    #[error("snapshot does not match live schema at table '{table}': {message}")]
    SchemaMismatch {
        table: String,
        column: Option<String>,
        message: String,
    },

    #[error(transparent)]
    CircularDependency(#[from] OrderError),

    #[error("rows of table '{table}' reference each other in a cycle (rows {})", join_rows(.rows))]
    CircularRowReference { table: String, rows: Vec<usize> },

    #[error(
        "row {row} of table '{table}': ({}) = {value} has no matching row in '{referenced_table}'",
        .columns.join(", ")
    )]
    ReferentialInvariantViolation {
        table: String,
        row: usize,
        columns: Vec<String>,
        referenced_table: String,
        value: String,
    },

    #[error(transparent)]
    Sink(#[from] SourceError),
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RestoreError {
    pub(crate) fn mismatch(table: &str, message: impl Into<String>) -> Self {
        RestoreError::SchemaMismatch {
            table: table.to_string(),
            column: None,
            message: message.into(),
        }
    }

    pub(crate) fn column_mismatch(table: &str, column: &str, message: impl Into<String>) -> Self {
        RestoreError::SchemaMismatch {
            table: table.to_string(),
            column: Some(column.to_string()),
            message: message.into(),
        }
    }

    /// Table the failure is about, when there is exactly one
    pub fn table(&self) -> Option<&str> {
        match self {
            RestoreError::UnsupportedFormat { .. } => None,
            RestoreError::SchemaMismatch { table, .. } => Some(table),
            RestoreError::CircularDependency(_) => None,
            RestoreError::CircularRowReference { table, .. } => Some(table),
            RestoreError::ReferentialInvariantViolation { table, .. } => Some(table),
            RestoreError::Sink(e) => Some(e.table()),
        }
    }

    /// Column the failure is about, if known
    pub fn column(&self) -> Option<&str> {
        match self {
            RestoreError::SchemaMismatch { column, .. } => column.as_deref(),
            RestoreError::Sink(e) => e.column(),
            _ => None,
        }
    }

    /// Row index (position in the snapshot table) the failure is about
    pub fn row(&self) -> Option<usize> {
        match self {
            RestoreError::ReferentialInvariantViolation { row, .. } => Some(*row),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_message_names_everything() {
        let err = RestoreError::ReferentialInvariantViolation {
            table: "user".into(),
            row: 0,
            columns: vec!["groupId".into()],
            referenced_table: "group".into(),
            value: "99".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("user"));
        assert!(msg.contains("(groupId) = 99"));
        assert!(msg.contains("'group'"));
        assert_eq!(err.row(), Some(0));
    }

    #[test]
    fn test_row_cycle_lists_rows() {
        let err = RestoreError::CircularRowReference {
            table: "category".into(),
            rows: vec![0, 2],
        };
        assert!(err.to_string().contains("rows 0, 2"));
        assert_eq!(err.table(), Some("category"));
    }

    #[test]
    fn test_mismatch_column() {
        let err = RestoreError::column_mismatch("user", "nickname", "unknown column");
        assert_eq!(err.column(), Some("nickname"));
        assert_eq!(err.table(), Some("user"));
    }
}
