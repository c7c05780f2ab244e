//! Database seams for the writer and reader
//!
//! The writer only needs to read rows; the reader also clears and inserts.
//! The SQLite implementation lives in `crate::sqlite`; tests substitute
//! their own.

use thiserror::Error;

use crate::catalog::TableDescriptor;

use super::row::Row;

/// Result type for row source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Failure talking to the database
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database error on table '{table}': {source}")]
    Database {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot convert column '{column}' of table '{table}': {message}")]
    Conversion {
        table: String,
        column: String,
        message: String,
    },
}

impl SourceError {
    /// Wrap a lower-level error for `table`
    pub fn database(
        table: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SourceError::Database {
            table: table.to_string(),
            source: source.into(),
        }
    }

    pub fn conversion(table: &str, column: &str, message: impl Into<String>) -> Self {
        SourceError::Conversion {
            table: table.to_string(),
            column: column.to_string(),
            message: message.into(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            SourceError::Database { table, .. } => table,
            SourceError::Conversion { table, .. } => table,
        }
    }

    /// Column involved, if known
    pub fn column(&self) -> Option<&str> {
        match self {
            SourceError::Database { .. } => None,
            SourceError::Conversion { column, .. } => Some(column),
        }
    }
}

/// Reads complete table contents.
pub trait RowSource {
    /// Every row of `table`, columns in live order, rows in a stable order
    fn read_rows(&self, table: &TableDescriptor) -> SourceResult<Vec<Row>>;
}

/// Replaces table contents. Callers own the surrounding transaction.
pub trait RowSink: RowSource {
    /// Delete every row; returns the number deleted
    fn clear_table(&self, table: &TableDescriptor) -> SourceResult<usize>;

    /// Insert one row exactly as given, keys included
    fn insert_row(&self, table: &TableDescriptor, row: &Row) -> SourceResult<()>;
}
