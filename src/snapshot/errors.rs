//! Snapshot document errors

use thiserror::Error;

/// Result type for document encoding and decoding
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A snapshot file could not be understood
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Not JSON at all
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("snapshot has no formatVersion")]
    MissingVersion,

    #[error("snapshot formatVersion is not an integer: {0}")]
    InvalidVersion(String),

    #[error("unsupported snapshot formatVersion {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    /// Version understood, body does not match the document shape
    #[error("snapshot body does not match format: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl DocumentError {
    /// Returns true if the failure is about the format version rather than
    /// the document body
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DocumentError::Malformed(_)
                | DocumentError::MissingVersion
                | DocumentError::InvalidVersion(_)
                | DocumentError::UnsupportedVersion { .. }
        )
    }
}
