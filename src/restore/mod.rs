//! Restore subsystem for relsnap
//!
//! Restore replaces the contents of the backed-up tables with a snapshot
//! document.
//!
//! - Zero writes until the document is fully validated
//! - Referential invariant checked before and after writing
//! - Deterministic insert order
//! - Explicit failure, never partial success
//!
//! The reader runs inside a transaction owned by the backup coordinator;
//! any error returned here is followed by a rollback.

mod errors;
mod reader;
mod row_order;
mod validator;

pub use errors::{RestoreError, RestoreResult};
pub use reader::{RestoreStats, SnapshotReader, TableCount};
pub use row_order::order_rows;
pub use validator::{validate_against_catalog, validate_format_version, verify_references};
