//! Snapshot validation for restore
//!
//! All checks here run before the first write. Any failure aborts the
//! restore with the database untouched.
//!
//! - Format version
//! - Document tables and columns against the live catalog
//! - Document table order against foreign keys
//! - Referential invariant over the whole dataset

use std::collections::{HashMap, HashSet};

use crate::catalog::{ColumnKind, ForeignKeyDescriptor, TableDescriptor};
use crate::snapshot::{KeyValue, Row, SnapshotDocument, TableSnapshot, Value, FORMAT_VERSION};

use super::errors::{RestoreError, RestoreResult};

/// Reject any document not written in the current format
pub fn validate_format_version(doc: &SnapshotDocument) -> RestoreResult<()> {
    if doc.format_version != FORMAT_VERSION {
        return Err(RestoreError::UnsupportedFormat {
            found: doc.format_version,
            supported: FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Pair every document table with its live descriptor, in document order.
///
/// Fails with `SchemaMismatch` when a table is unknown or repeated, a row
/// names a column the live table lacks, or a table precedes a table it
/// references.
pub fn validate_against_catalog<'a>(
    doc: &'a SnapshotDocument,
    catalog: &'a [TableDescriptor],
) -> RestoreResult<Vec<(&'a TableDescriptor, &'a TableSnapshot)>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries = Vec::with_capacity(doc.tables.len());

    for snapshot in &doc.tables {
        let table = catalog
            .iter()
            .find(|t| t.name == snapshot.name)
            .ok_or_else(|| RestoreError::mismatch(&snapshot.name, "table not in live schema"))?;

        if !seen.insert(snapshot.name.as_str()) {
            return Err(RestoreError::mismatch(
                &snapshot.name,
                "table appears more than once",
            ));
        }

        for (index, row) in snapshot.rows.iter().enumerate() {
            if let Some(column) = row.columns().find(|c| !table.has_column(c)) {
                return Err(RestoreError::column_mismatch(
                    &table.name,
                    column,
                    format!("row {} has a column the live table lacks", index),
                ));
            }
        }

        entries.push((table, snapshot));
    }

    // A referenced table that is present must come first
    for (position, (table, _)) in entries.iter().enumerate() {
        for dependency in table.dependencies() {
            let later = entries[position + 1..]
                .iter()
                .any(|(t, _)| t.name == dependency);
            if later {
                return Err(RestoreError::mismatch(
                    &table.name,
                    format!("appears before referenced table '{}'", dependency),
                ));
            }
        }
    }

    Ok(entries)
}

/// Check that every non-null foreign key in `dataset` matches a row of the
/// referenced table within `dataset`.
///
/// Rows must be in storage form. Both sides are compared with the
/// referenced columns' affinity applied, as SQLite does. Tables missing
/// from `dataset` count as empty. A foreign key with any null (or absent)
/// column is not checked. The first violation in dataset order is
/// reported.
pub fn verify_references(dataset: &[(&TableDescriptor, &[Row])]) -> RestoreResult<()> {
    let mut index = KeyIndex::default();

    for (table, rows) in dataset {
        for fk in &table.foreign_keys {
            let referenced = dataset.iter().find(|(t, _)| t.name == fk.referenced_table);
            let kinds = referenced_kinds(referenced.map(|(t, _)| *t), fk);
            let referenced_rows = referenced.map(|(_, rows)| *rows).unwrap_or(&[]);
            let keys = index.keys(fk, referenced_rows, &kinds);

            for (position, row) in rows.iter().enumerate() {
                let Some(key) = key_of(row, &fk.columns, &kinds) else {
                    continue;
                };
                if !keys.contains(&key) {
                    return Err(RestoreError::ReferentialInvariantViolation {
                        table: table.name.clone(),
                        row: position,
                        columns: fk.columns.clone(),
                        referenced_table: fk.referenced_table.clone(),
                        value: describe(row, &fk.columns),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Kind of each referenced column; `None` where the table is unknown
pub(crate) fn referenced_kinds(
    referenced: Option<&TableDescriptor>,
    fk: &ForeignKeyDescriptor,
) -> Vec<Option<ColumnKind>> {
    fk.referenced_columns
        .iter()
        .map(|column| referenced.and_then(|t| t.column(column)).map(|c| c.kind))
        .collect()
}

/// Key of `row` over `columns`, each value read with the matching kind's
/// affinity; `None` if any is null or absent
pub(crate) fn key_of(
    row: &Row,
    columns: &[String],
    kinds: &[Option<ColumnKind>],
) -> Option<Vec<KeyValue>> {
    columns
        .iter()
        .zip(kinds)
        .map(|(column, kind)| {
            let value = row.get(column)?;
            match kind {
                Some(kind) => value.with_affinity(*kind).key(),
                None => value.key(),
            }
        })
        .collect()
}

fn describe(row: &Row, columns: &[String]) -> String {
    let values: Vec<String> = columns
        .iter()
        .map(|c| row.get(c).map(Value::to_string).unwrap_or_else(|| "null".into()))
        .collect();
    if values.len() == 1 {
        values.into_iter().collect()
    } else {
        format!("({})", values.join(", "))
    }
}

/// Referenced keys, built once per (table, columns) pair
#[derive(Default)]
struct KeyIndex {
    keys: HashMap<(String, Vec<String>), HashSet<Vec<KeyValue>>>,
}

impl KeyIndex {
    fn keys(
        &mut self,
        fk: &ForeignKeyDescriptor,
        rows: &[Row],
        kinds: &[Option<ColumnKind>],
    ) -> &HashSet<Vec<KeyValue>> {
        self.keys
            .entry((fk.referenced_table.clone(), fk.referenced_columns.clone()))
            .or_insert_with(|| {
                rows.iter()
                    .filter_map(|row| key_of(row, &fk.referenced_columns, kinds))
                    .collect()
            })
    }
}
