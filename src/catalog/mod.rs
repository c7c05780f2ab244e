//! Schema catalog
//!
//! Describes the backup-relevant tables of the live database: columns,
//! primary keys and outgoing foreign keys. Table structure is discovered
//! at runtime, so adding a related table needs only a configuration change.
//!
//! # Rules
//!
//! - Only allow-listed tables are described
//! - Descriptors are rebuilt on every export and restore
//! - A foreign key leaving the allow-list is an error, not a silent gap

mod errors;
mod loader;
mod types;

pub use errors::{CatalogError, CatalogResult};
pub use loader::SchemaCatalog;
pub use types::{ColumnDescriptor, ColumnKind, ForeignKeyDescriptor, TableDescriptor};
