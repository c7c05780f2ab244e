//! Observable backup and restore events
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of a log line.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,
    /// Live schema described
    CatalogLoaded,

    // Export
    /// Export started
    ExportStart,
    /// One table read into the document
    TableExported,
    /// Snapshot file written and synced
    ExportComplete,
    /// Export failed; no file left behind
    ExportFailed,

    // Restore
    /// Restore started
    RestoreStart,
    /// Existing rows of one table deleted
    TableCleared,
    /// Rows of one table inserted
    TableRestored,
    /// Restore committed
    RestoreComplete,
    /// Restore transaction rolled back
    RestoreRolledBack,
    /// Restore failed
    RestoreFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",

            Event::ExportStart => "EXPORT_BEGIN",
            Event::TableExported => "TABLE_EXPORTED",
            Event::ExportComplete => "EXPORT_COMPLETE",
            Event::ExportFailed => "EXPORT_FAILED",

            Event::RestoreStart => "RESTORE_BEGIN",
            Event::TableCleared => "TABLE_CLEARED",
            Event::TableRestored => "TABLE_RESTORED",
            Event::RestoreComplete => "RESTORE_COMPLETE",
            Event::RestoreRolledBack => "RESTORE_ROLLED_BACK",
            Event::RestoreFailed => "RESTORE_FAILED",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::ExportFailed | Event::RestoreFailed | Event::RestoreRolledBack
        )
    }

    /// Per-table events are detail, logged at TRACE
    pub fn is_detail(&self) -> bool {
        matches!(
            self,
            Event::TableExported | Event::TableCleared | Event::TableRestored
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
