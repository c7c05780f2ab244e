//! Snapshot reader (restore side)
//!
//! Replaces the contents of every catalog table with the contents of a
//! snapshot document. The reader validates everything it can before the
//! first write and re-checks what it wrote afterwards; it does not own the
//! transaction. Callers must wrap `restore` in one and roll back on error.

use serde::Serialize;

use crate::catalog::{ColumnKind, TableDescriptor};
use crate::observability::{log_event_with_fields, Event};
use crate::order;
use crate::snapshot::{timestamp, Row, RowSink, SnapshotDocument, Value};

use super::errors::RestoreResult;
use super::row_order::order_rows;
use super::validator::{validate_against_catalog, validate_format_version, verify_references};

/// Rows written for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

/// Outcome of a successful restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreStats {
    /// Rows inserted per table, in insert order
    pub tables: Vec<TableCount>,
    /// Rows deleted while clearing
    pub cleared: usize,
}

impl RestoreStats {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Rows inserted into `table`, if it was in the snapshot
    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Restores snapshot documents through a row sink.
pub struct SnapshotReader;

impl SnapshotReader {
    /// Replace every table in `catalog` with the contents of `doc`.
    ///
    /// Sequence:
    /// 1. Check the format version
    /// 2. Match tables, columns and table order against `catalog`
    /// 3. Check the referential invariant on the document, in storage form
    /// 4. Order rows of self-referencing tables
    /// 5. Clear every catalog table, children first
    /// 6. Insert rows in document order
    /// 7. Re-read every catalog table and check the invariant again
    ///
    /// Steps 1-4 never write. Catalog tables absent from `doc` end up empty.
    pub fn restore<S: RowSink + ?Sized>(
        doc: &SnapshotDocument,
        catalog: &[TableDescriptor],
        sink: &S,
    ) -> RestoreResult<RestoreStats> {
        validate_format_version(doc)?;

        let entries = validate_against_catalog(doc, catalog)?;

        let decoded: Vec<(&TableDescriptor, Vec<Row>)> = entries
            .iter()
            .map(|(table, snapshot)| {
                let rows = snapshot.rows.iter().map(|row| decode_row(table, row)).collect();
                (*table, rows)
            })
            .collect();

        let dataset: Vec<(&TableDescriptor, &[Row])> = decoded
            .iter()
            .map(|(table, rows)| (*table, rows.as_slice()))
            .collect();
        verify_references(&dataset)?;

        let mut plan = Vec::with_capacity(decoded.len());
        for (table, rows) in &decoded {
            let positions = order_rows(table, rows)?;
            let ordered: Vec<&Row> = positions.into_iter().map(|p| &rows[p]).collect();
            plan.push((*table, ordered));
        }

        let teardown = order::teardown(catalog)?;

        // Nothing has been written up to here
        let mut stats = RestoreStats::default();

        for table in &teardown {
            let deleted = sink.clear_table(table)?;
            stats.cleared += deleted;

            let count = deleted.to_string();
            log_event_with_fields(
                Event::TableCleared,
                &[("table", table.name.as_str()), ("rows", count.as_str())],
            );
        }

        for (table, rows) in &plan {
            for row in rows {
                sink.insert_row(table, row)?;
            }

            let count = rows.len().to_string();
            log_event_with_fields(
                Event::TableRestored,
                &[("table", table.name.as_str()), ("rows", count.as_str())],
            );

            stats.tables.push(TableCount {
                table: table.name.clone(),
                rows: rows.len(),
            });
        }

        let written = teardown
            .iter()
            .rev()
            .map(|table| sink.read_rows(table).map(|rows| (table, rows)))
            .collect::<Result<Vec<_>, _>>()?;
        let written: Vec<(&TableDescriptor, &[Row])> = written
            .iter()
            .map(|(table, rows)| (*table, rows.as_slice()))
            .collect();
        verify_references(&written)?;

        Ok(stats)
    }
}

/// Storage form of a snapshot row
fn decode_row(table: &TableDescriptor, row: &Row) -> Row {
    row.iter()
        .map(|(column, value)| {
            let kind = table.column(column).map(|c| c.kind);
            (column.to_string(), decode_value(kind, value))
        })
        .collect()
}

/// Storage form of a snapshot value
fn decode_value(kind: Option<ColumnKind>, value: &Value) -> Value {
    match (kind, value) {
        (_, Value::Bool(b)) => Value::Integer(i64::from(*b)),
        (_, Value::Literal(literal)) => Value::Text(literal.text.clone()),
        (Some(ColumnKind::Timestamp), Value::Text(text)) if timestamp::is_snapshot_text(text) => {
            timestamp::to_storage_text(text)
                .map(Value::Text)
                .unwrap_or_else(|| value.clone())
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::RestoreError;
    use crate::snapshot::{SourceError, SourceResult};
    use std::cell::{Cell, RefCell};

    /// In-memory sink recording every call
    #[derive(Default)]
    struct MemorySink {
        tables: RefCell<Vec<(String, Vec<Row>)>>,
        calls: RefCell<Vec<String>>,
        fail_on_insert: Cell<Option<usize>>,
        /// (table, column, value) overwritten on every insert into `table`
        overwrite: RefCell<Option<(String, String, Value)>>,
    }

    impl MemorySink {
        fn with_rows(tables: Vec<(&str, Vec<Row>)>) -> Self {
            let sink = MemorySink::default();
            *sink.tables.borrow_mut() = tables
                .into_iter()
                .map(|(name, rows)| (name.to_string(), rows))
                .collect();
            sink
        }

        fn rows(&self, table: &str) -> Vec<Row> {
            self.tables
                .borrow()
                .iter()
                .find(|(name, _)| name == table)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default()
        }
    }

    impl crate::snapshot::RowSource for MemorySink {
        fn read_rows(&self, table: &TableDescriptor) -> SourceResult<Vec<Row>> {
            Ok(self.rows(&table.name))
        }
    }

    impl RowSink for MemorySink {
        fn clear_table(&self, table: &TableDescriptor) -> SourceResult<usize> {
            self.calls.borrow_mut().push(format!("clear {}", table.name));
            let mut tables = self.tables.borrow_mut();
            let deleted = tables
                .iter()
                .find(|(name, _)| *name == table.name)
                .map(|(_, rows)| rows.len())
                .unwrap_or(0);
            tables.retain(|(name, _)| *name != table.name);
            Ok(deleted)
        }

        fn insert_row(&self, table: &TableDescriptor, row: &Row) -> SourceResult<()> {
            if let Some(remaining) = self.fail_on_insert.get() {
                if remaining == 0 {
                    return Err(SourceError::conversion(&table.name, "id", "injected failure"));
                }
                self.fail_on_insert.set(Some(remaining - 1));
            }
            self.calls.borrow_mut().push(format!("insert {}", table.name));
            let mut row = row.clone();
            if let Some((target, column, value)) = &*self.overwrite.borrow() {
                if *target == table.name {
                    row.push(column, value.clone());
                }
            }
            let mut tables = self.tables.borrow_mut();
            match tables.iter_mut().find(|(name, _)| *name == table.name) {
                Some((_, rows)) => rows.push(row),
                None => tables.push((table.name.clone(), vec![row])),
            }
            Ok(())
        }
    }

    fn group() -> TableDescriptor {
        TableDescriptor::new("group")
            .with_column("id", "INTEGER")
            .with_column("name", "VARCHAR")
            .with_primary_key(&["id"])
    }

    fn user() -> TableDescriptor {
        TableDescriptor::new("user")
            .with_column("id", "INTEGER")
            .with_column("name", "VARCHAR")
            .with_column("active", "BOOLEAN")
            .with_column("createdAt", "DATETIME")
            .with_column("groupId", "INTEGER")
            .with_primary_key(&["id"])
            .with_foreign_key(&["groupId"], "group", &["id"])
    }

    fn category() -> TableDescriptor {
        TableDescriptor::new("category")
            .with_column("id", "INTEGER")
            .with_column("parentId", "INTEGER")
            .with_primary_key(&["id"])
            .with_foreign_key(&["parentId"], "category", &["id"])
    }

    fn scenario_a() -> SnapshotDocument {
        let mut doc = SnapshotDocument::new();
        doc.push_table("group", vec![Row::new().with("id", 1).with("name", "eng")]);
        doc.push_table(
            "user",
            vec![Row::new()
                .with("id", 10)
                .with("name", "ann")
                .with("active", true)
                .with("createdAt", "2024-03-01T12:00:00.250Z")
                .with("groupId", 1)],
        );
        doc
    }

    #[test]
    fn test_restore_clears_children_first_then_inserts_parents_first() {
        let sink = MemorySink::with_rows(vec![
            ("group", vec![Row::new().with("id", 7)]),
            ("user", vec![Row::new().with("id", 70).with("groupId", 7)]),
        ]);

        let stats = SnapshotReader::restore(&scenario_a(), &[user(), group()], &sink).unwrap();

        assert_eq!(
            *sink.calls.borrow(),
            vec!["clear user", "clear group", "insert group", "insert user"]
        );
        assert_eq!(stats.cleared, 2);
        assert_eq!(stats.total_rows(), 2);
        assert_eq!(stats.rows_for("user"), Some(1));
    }

    #[test]
    fn test_values_written_in_storage_form() {
        let sink = MemorySink::default();
        SnapshotReader::restore(&scenario_a(), &[group(), user()], &sink).unwrap();

        let users = sink.rows("user");
        assert_eq!(users[0].get("active"), Some(&Value::Integer(1)));
        assert_eq!(
            users[0].get("createdAt"),
            Some(&Value::text("2024-03-01 12:00:00.250"))
        );
    }

    #[test]
    fn test_literal_and_non_canonical_text_written_verbatim() {
        let mut doc = SnapshotDocument::new();
        doc.push_table("group", vec![Row::new().with("id", 1)]);
        doc.push_table(
            "user",
            vec![
                Row::new()
                    .with("id", 1)
                    .with("createdAt", Value::literal("2024-03-01T12:00:00Z")),
                Row::new().with("id", 2).with("createdAt", "2024-03-01T12:00:00.000Z"),
            ],
        );
        let sink = MemorySink::default();

        SnapshotReader::restore(&doc, &[group(), user()], &sink).unwrap();

        let users = sink.rows("user");
        assert_eq!(users[0].get("createdAt"), Some(&Value::text("2024-03-01T12:00:00Z")));
        assert_eq!(users[1].get("createdAt"), Some(&Value::text("2024-03-01T12:00:00.000Z")));
    }

    #[test]
    fn test_written_rows_rechecked_after_inserts() {
        let sink = MemorySink::default();
        *sink.overwrite.borrow_mut() =
            Some(("user".to_string(), "groupId".to_string(), Value::Integer(42)));

        let err = SnapshotReader::restore(&scenario_a(), &[group(), user()], &sink).unwrap_err();

        assert!(sink.calls.borrow().contains(&"insert user".to_string()));
        match err {
            RestoreError::ReferentialInvariantViolation {
                table,
                row,
                referenced_table,
                value,
                ..
            } => {
                assert_eq!(table, "user");
                assert_eq!(row, 0);
                assert_eq!(referenced_table, "group");
                assert_eq!(value, "42");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parent_text_key_matches_integer_reference() {
        let parent = TableDescriptor::new("p")
            .with_column("code", "TEXT")
            .with_primary_key(&["code"]);
        let child = TableDescriptor::new("c")
            .with_column("id", "INTEGER")
            .with_column("pc", "INTEGER")
            .with_primary_key(&["id"])
            .with_foreign_key(&["pc"], "p", &["code"]);
        let mut doc = SnapshotDocument::new();
        doc.push_table("p", vec![Row::new().with("code", "1")]);
        doc.push_table("c", vec![Row::new().with("id", 1).with("pc", 1)]);
        let sink = MemorySink::default();

        let stats = SnapshotReader::restore(&doc, &[parent, child], &sink).unwrap();
        assert_eq!(stats.total_rows(), 2);
    }

    #[test]
    fn test_dangling_reference_writes_nothing() {
        let mut doc = SnapshotDocument::new();
        doc.push_table("group", vec![Row::new().with("id", 1)]);
        doc.push_table("user", vec![Row::new().with("id", 1).with("groupId", 99)]);
        let sink = MemorySink::with_rows(vec![("group", vec![Row::new().with("id", 5)])]);

        let err = SnapshotReader::restore(&doc, &[group(), user()], &sink).unwrap_err();

        assert!(matches!(err, RestoreError::ReferentialInvariantViolation { .. }));
        assert!(sink.calls.borrow().is_empty());
        assert_eq!(sink.rows("group").len(), 1);
    }

    #[test]
    fn test_unknown_table_writes_nothing() {
        let mut doc = SnapshotDocument::new();
        doc.push_table("audit", vec![]);
        let sink = MemorySink::default();

        let err = SnapshotReader::restore(&doc, &[group()], &sink).unwrap_err();

        assert!(matches!(err, RestoreError::SchemaMismatch { .. }));
        assert!(sink.calls.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_version_writes_nothing() {
        let mut doc = scenario_a();
        doc.format_version = 3;
        let sink = MemorySink::default();

        let err = SnapshotReader::restore(&doc, &[group(), user()], &sink).unwrap_err();

        assert!(matches!(err, RestoreError::UnsupportedFormat { found: 3, .. }));
        assert!(sink.calls.borrow().is_empty());
    }

    #[test]
    fn test_self_referencing_rows_inserted_parents_first() {
        let mut doc = SnapshotDocument::new();
        doc.push_table(
            "category",
            vec![
                Row::new().with("id", 3).with("parentId", 2),
                Row::new().with("id", 2).with("parentId", 1),
                Row::new().with("id", 1).with("parentId", Value::Null),
            ],
        );
        let sink = MemorySink::default();

        SnapshotReader::restore(&doc, &[category()], &sink).unwrap();

        let ids: Vec<Value> = sink
            .rows("category")
            .iter()
            .filter_map(|r| r.get("id").cloned())
            .collect();
        assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn test_sink_failure_propagates() {
        let sink = MemorySink::default();
        sink.fail_on_insert.set(Some(1));

        let err = SnapshotReader::restore(&scenario_a(), &[group(), user()], &sink).unwrap_err();

        assert!(matches!(err, RestoreError::Sink(_)));
        assert_eq!(err.table(), Some("user"));
    }

    #[test]
    fn test_tables_missing_from_snapshot_are_emptied() {
        let mut doc = SnapshotDocument::new();
        doc.push_table("group", vec![Row::new().with("id", 1)]);
        let sink = MemorySink::with_rows(vec![("user", vec![Row::new().with("id", 4)])]);

        let stats = SnapshotReader::restore(&doc, &[group(), user()], &sink).unwrap();

        assert!(sink.rows("user").is_empty());
        assert_eq!(stats.rows_for("user"), None);
    }
}
