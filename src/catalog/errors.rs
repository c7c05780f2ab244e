//! Catalog error types
//!
//! Every catalog failure means the live schema could not be described;
//! nothing has been read or written when one is raised.

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Schema introspection failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to introspect table '{table}': {source}")]
    Introspection {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("table '{0}' is allow-listed but does not exist")]
    MissingTable(String),

    #[error("table '{table}' references '{referenced}', which is not part of the backup")]
    ExternalReference { table: String, referenced: String },

    #[error("foreign key {id} of table '{table}' cannot be resolved: {reason}")]
    UnresolvedForeignKey {
        table: String,
        id: i64,
        reason: String,
    },
}

impl CatalogError {
    /// Table the failure is about
    pub fn table(&self) -> &str {
        match self {
            CatalogError::Introspection { table, .. } => table,
            CatalogError::MissingTable(table) => table,
            CatalogError::ExternalReference { table, .. } => table,
            CatalogError::UnresolvedForeignKey { table, .. } => table,
        }
    }
}
