//! Snapshot documents and the export-side writer
//!
//! A snapshot is a self-describing JSON value holding every row of every
//! backed-up table, tables in dependency order. It has no server-side
//! state; the coordinator persists it and reads it back unchanged.
//!
//! # Value encoding
//!
//! - Integers and reals keep their numeric type
//! - Boolean columns become JSON booleans
//! - Timestamp columns become RFC 3339 UTC text when that is reversible
//! - Nulls are explicit
//! - Blobs are base64 objects
//! - Text that only looks normalized is a `$text` object

mod document;
mod errors;
mod row;
mod source;
pub(crate) mod timestamp;
mod value;
mod writer;

pub use document::{SnapshotDocument, TableSnapshot, FORMAT_VERSION};
pub use errors::{DocumentError, DocumentResult};
pub use row::Row;
pub use source::{RowSink, RowSource, SourceError, SourceResult};
pub use value::{BlobValue, KeyValue, LiteralText, Value};
pub use writer::SnapshotWriter;
