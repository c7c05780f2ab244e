//! Snapshot document
//!
//! ```json
//! {
//!   "formatVersion": 1,
//!   "tables": [
//!     { "name": "group", "rows": [ { "id": 1, "name": "eng" } ] },
//!     { "name": "user",  "rows": [ { "id": 1, "groupId": 1 } ] }
//!   ]
//! }
//! ```
//!
//! Table order is dependency order at export time and is replayed as-is.

use serde::{Deserialize, Serialize};

use super::errors::{DocumentError, DocumentResult};
use super::row::Row;

/// The only format version this build reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// Rows of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSnapshot {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Complete portable snapshot of the backed-up tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SnapshotDocument {
    pub format_version: u32,
    pub tables: Vec<TableSnapshot>,
}

impl SnapshotDocument {
    /// Empty document at the current format version
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            tables: Vec::new(),
        }
    }

    /// Append a table; order of calls is the replay order
    pub fn push_table(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.tables.push(TableSnapshot {
            name: name.into(),
            rows,
        });
    }

    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> DocumentResult<String> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Serialize)
    }

    /// Parse a document, checking the version before the body.
    pub fn from_json(text: &str) -> DocumentResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(text).map_err(DocumentError::Malformed)?;

        let version = raw
            .get("formatVersion")
            .ok_or(DocumentError::MissingVersion)?;
        let found = version
            .as_u64()
            .ok_or_else(|| DocumentError::InvalidVersion(version.to_string()))?;
        if found != u64::from(FORMAT_VERSION) {
            return Err(DocumentError::UnsupportedVersion {
                found,
                supported: FORMAT_VERSION,
            });
        }

        serde_json::from_value(raw).map_err(DocumentError::Shape)
    }
}

impl Default for SnapshotDocument {
    fn default() -> Self {
        Self::new()
    }
}
