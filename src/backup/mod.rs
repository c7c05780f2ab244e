//! Backup coordinator for relsnap
//!
//! The coordinator owns the database connection and sequences the other
//! components for the two operations.
//!
//! # Export
//!
//! 1. Open a read transaction (one consistent view of every table)
//! 2. Describe the allow-listed tables
//! 3. Order them, referenced tables first
//! 4. Read every table into a snapshot document
//! 5. Write the document atomically (temp file, fsync, rename, fsync dir)
//!
//! # Restore
//!
//! 1. Read and parse the snapshot file
//! 2. Enable foreign-key enforcement
//! 3. Open an IMMEDIATE transaction
//! 4. Describe and order the live tables
//! 5. Run the snapshot reader
//! 6. Commit, or roll back on any error
//!
//! Export is read-only. Restore either commits everything or nothing.

mod errors;
mod file;

pub use errors::{BackupError, BackupErrorCode, BackupResult, ErrorContext, Severity};
pub use file::temp_path;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::catalog::{SchemaCatalog, TableDescriptor};
use crate::config::RelsnapConfig;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::order;
use crate::restore::{RestoreStats, SnapshotReader};
use crate::snapshot::{SnapshotDocument, SnapshotWriter};

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub tables: usize,
    pub rows: usize,
    pub bytes: usize,
}

/// Sequences export and restore over one connection.
///
/// # Usage
///
/// ```ignore
/// let mut coordinator = BackupCoordinator::new(conn, vec!["group".into(), "user".into()]);
/// coordinator.export(Path::new("backup.json"))?;
/// coordinator.restore(Path::new("backup.json"))?;
/// ```
pub struct BackupCoordinator {
    conn: Connection,
    tables: Vec<String>,
}

impl BackupCoordinator {
    /// Take ownership of `conn` and back up `tables`
    pub fn new(conn: Connection, tables: Vec<String>) -> Self {
        Self { conn, tables }
    }

    /// Open the configured database with its busy timeout
    pub fn open(config: &RelsnapConfig) -> BackupResult<Self> {
        let conn = Connection::open(&config.database).map_err(|e| {
            BackupError::database(
                format!("failed to open database {}", config.database.display()),
                e,
            )
        })?;
        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| BackupError::database("failed to set busy timeout", e))?;

        Ok(Self::new(conn, config.tables.clone()))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Give the connection back
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Allow-listed table names
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Build a snapshot document from the live database
    pub fn export_document(&mut self) -> BackupResult<SnapshotDocument> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BackupError::database("failed to begin read transaction", e))?;

        let catalog = load_catalog(&tx, &self.tables)?;
        let ordered = order::order(&catalog)?;
        let doc = SnapshotWriter::write(&ordered, &*tx)?;

        // Read-only: nothing to keep
        tx.rollback()
            .map_err(|e| BackupError::database("failed to end read transaction", e))?;

        Ok(doc)
    }

    /// Export the live database to `path`.
    ///
    /// On failure no file is left at `path.tmp`, and any earlier file at
    /// `path` is untouched.
    pub fn export(&mut self, path: &Path) -> BackupResult<ExportSummary> {
        let path_text = path.display().to_string();
        let scope = ObservationScope::begin(Event::ExportStart, &[("path", path_text.as_str())]);

        let result = self.export_document().and_then(|doc| {
            let json = doc.to_json()?;
            file::write_atomic(path, &json)?;
            Ok(ExportSummary {
                path: path.to_path_buf(),
                tables: doc.tables.len(),
                rows: doc.total_rows(),
                bytes: json.len(),
            })
        });

        match &result {
            Ok(summary) => {
                let tables = summary.tables.to_string();
                let rows = summary.rows.to_string();
                scope.complete(
                    Event::ExportComplete,
                    &[("tables", tables.as_str()), ("rows", rows.as_str())],
                );
            }
            Err(e) => scope.fail(Event::ExportFailed, &e.to_string()),
        }

        result
    }

    /// Replace the allow-listed tables with the contents of `doc`.
    ///
    /// Runs in one IMMEDIATE transaction with foreign keys enforced. Any
    /// error rolls the transaction back.
    pub fn restore_document(&mut self, doc: &SnapshotDocument) -> BackupResult<RestoreStats> {
        // No effect inside a transaction, so set it first
        self.conn
            .pragma_update(None, "foreign_keys", true)
            .map_err(|e| BackupError::database("failed to enable foreign keys", e))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| BackupError::database("failed to begin restore transaction", e))?;

        let result = (|| -> BackupResult<RestoreStats> {
            let catalog = load_catalog(&tx, &self.tables)?;
            order::order(&catalog)?;
            Ok(SnapshotReader::restore(doc, &catalog, &*tx)?)
        })();

        match result {
            Ok(stats) => {
                tx.commit()
                    .map_err(|e| BackupError::database("failed to commit restore", e))?;
                Ok(stats)
            }
            Err(e) => {
                let rollback = tx.rollback();
                let outcome = if rollback.is_ok() { "ok" } else { "failed" };
                log_event_with_fields(
                    Event::RestoreRolledBack,
                    &[("code", e.code().as_str()), ("rollback", outcome)],
                );
                Err(e)
            }
        }
    }

    /// Restore the allow-listed tables from the snapshot at `path`
    pub fn restore(&mut self, path: &Path) -> BackupResult<RestoreStats> {
        let path_text = path.display().to_string();
        let scope = ObservationScope::begin(Event::RestoreStart, &[("path", path_text.as_str())]);

        let result = file::read_snapshot(path)
            .and_then(|text| Ok(SnapshotDocument::from_json(&text)?))
            .and_then(|doc| self.restore_document(&doc));

        match &result {
            Ok(stats) => {
                let tables = stats.tables.len().to_string();
                let rows = stats.total_rows().to_string();
                scope.complete(
                    Event::RestoreComplete,
                    &[("tables", tables.as_str()), ("rows", rows.as_str())],
                );
            }
            Err(e) => scope.fail(Event::RestoreFailed, &e.to_string()),
        }

        result
    }
}

fn load_catalog(conn: &Connection, tables: &[String]) -> BackupResult<Vec<TableDescriptor>> {
    let catalog = SchemaCatalog::new(conn, tables).load()?;

    let count = catalog.len().to_string();
    log_event_with_fields(Event::CatalogLoaded, &[("tables", count.as_str())]);

    Ok(catalog)
}
