//! Snapshot writer (export side)
//!
//! Reads every table exactly once, in the order given, and produces a
//! document. Read-only: the writer never writes to the database and never
//! touches the filesystem.

use crate::catalog::{ColumnKind, TableDescriptor};
use crate::observability::{log_event_with_fields, Event};

use super::document::SnapshotDocument;
use super::row::Row;
use super::source::{RowSource, SourceError, SourceResult};
use super::timestamp;
use super::value::Value;

/// Builds snapshot documents from a row source.
pub struct SnapshotWriter;

impl SnapshotWriter {
    /// Export `order` (ascending dependency order) from `source`.
    ///
    /// Rows are neither skipped, reordered nor deduplicated. Columns are
    /// emitted in live order.
    pub fn write<S: RowSource + ?Sized>(
        order: &[TableDescriptor],
        source: &S,
    ) -> SourceResult<SnapshotDocument> {
        let mut doc = SnapshotDocument::new();

        for table in order {
            let rows = source
                .read_rows(table)?
                .iter()
                .map(|row| encode_row(table, row))
                .collect::<SourceResult<Vec<_>>>()?;

            let count = rows.len().to_string();
            log_event_with_fields(
                Event::TableExported,
                &[("table", table.name.as_str()), ("rows", count.as_str())],
            );

            doc.push_table(table.name.clone(), rows);
        }

        Ok(doc)
    }
}

/// Rebuild `row` in live column order with snapshot encodings applied
fn encode_row(table: &TableDescriptor, row: &Row) -> SourceResult<Row> {
    let mut encoded = Row::new();

    for column in &table.columns {
        let value = row.get(&column.name).ok_or_else(|| {
            SourceError::conversion(&table.name, &column.name, "column missing from source row")
        })?;
        encoded.push(&column.name, encode_value(column.kind, value));
    }

    Ok(encoded)
}

/// Snapshot encoding of a stored value
pub(crate) fn encode_value(kind: ColumnKind, value: &Value) -> Value {
    match (kind, value) {
        (ColumnKind::Boolean, Value::Integer(0)) => Value::Bool(false),
        (ColumnKind::Boolean, Value::Integer(1)) => Value::Bool(true),
        (ColumnKind::Timestamp, Value::Text(text)) => match timestamp::normalize(text) {
            Some(normalized) => Value::Text(normalized),
            // Restore would convert it; keep it as written
            None if timestamp::is_snapshot_text(text) => Value::literal(text.as_str()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Source returning canned rows and recording reads
    struct CannedSource {
        rows: Vec<(String, Vec<Row>)>,
        reads: RefCell<Vec<String>>,
    }

    impl RowSource for CannedSource {
        fn read_rows(&self, table: &TableDescriptor) -> SourceResult<Vec<Row>> {
            self.reads.borrow_mut().push(table.name.clone());
            Ok(self
                .rows
                .iter()
                .find(|(name, _)| *name == table.name)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        }
    }

    fn user_table() -> TableDescriptor {
        TableDescriptor::new("user")
            .with_column("id", "INTEGER")
            .with_column("active", "BOOLEAN")
            .with_column("createdAt", "DATETIME")
            .with_column("score", "REAL")
            .with_primary_key(&["id"])
    }

    #[test]
    fn test_columns_follow_live_order() {
        let source = CannedSource {
            rows: vec![(
                "user".into(),
                vec![Row::new()
                    .with("score", 1.5)
                    .with("createdAt", "2024-01-02 03:04:05.250")
                    .with("active", 1)
                    .with("id", 7)],
            )],
            reads: RefCell::new(Vec::new()),
        };

        let doc = SnapshotWriter::write(&[user_table()], &source).unwrap();
        let row = &doc.tables[0].rows[0];

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["id", "active", "createdAt", "score"]);
        assert_eq!(row.get("active"), Some(&Value::Bool(true)));
        assert_eq!(
            row.get("createdAt"),
            Some(&Value::Text("2024-01-02T03:04:05.250Z".into()))
        );
        assert_eq!(row.get("score"), Some(&Value::Real(1.5)));
    }

    #[test]
    fn test_each_table_read_once_in_order() {
        let source = CannedSource {
            rows: Vec::new(),
            reads: RefCell::new(Vec::new()),
        };
        let order = vec![TableDescriptor::new("group"), TableDescriptor::new("user")];

        let doc = SnapshotWriter::write(&order, &source).unwrap();

        assert_eq!(*source.reads.borrow(), vec!["group", "user"]);
        let names: Vec<&str> = doc.table_names().collect();
        assert_eq!(names, vec!["group", "user"]);
    }

    #[test]
    fn test_timestamps_keep_every_digit() {
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::text("2024-05-06 07:08:09.123456")),
            Value::text("2024-05-06T07:08:09.123456Z")
        );
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::text("2024-01-02 03:04:05")),
            Value::text("2024-01-02T03:04:05Z")
        );
        // No exact way back: exported as written
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::text("2024-05-06 07:08:09.1231")),
            Value::text("2024-05-06 07:08:09.1231")
        );
    }

    #[test]
    fn test_stored_rfc3339_text_is_tagged_literal() {
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::text("2024-01-02T03:04:05.123Z")),
            Value::literal("2024-01-02T03:04:05.123Z")
        );
        assert_eq!(
            encode_value(ColumnKind::Text, &Value::text("2024-01-02T03:04:05.123Z")),
            Value::text("2024-01-02T03:04:05.123Z")
        );
    }

    #[test]
    fn test_values_kept_when_not_encodable() {
        assert_eq!(
            encode_value(ColumnKind::Boolean, &Value::Integer(5)),
            Value::Integer(5)
        );
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::text("soon")),
            Value::text("soon")
        );
        assert_eq!(
            encode_value(ColumnKind::Timestamp, &Value::Integer(1_700_000_000)),
            Value::Integer(1_700_000_000)
        );
        assert_eq!(encode_value(ColumnKind::Text, &Value::Null), Value::Null);
    }

    #[test]
    fn test_missing_column_is_error() {
        let source = CannedSource {
            rows: vec![("user".into(), vec![Row::new().with("id", 1)])],
            reads: RefCell::new(Vec::new()),
        };
        let err = SnapshotWriter::write(&[user_table()], &source).unwrap_err();
        assert_eq!(err.column(), Some("active"));
    }
}
