//! Insert order for rows of a self-referencing table
//!
//! A row that references another row of the same table must be inserted
//! after it. Rows are graph nodes keyed by their position in the snapshot,
//! so ties fall back to snapshot order.

use std::collections::HashMap;

use crate::catalog::TableDescriptor;
use crate::order::DependencyGraph;
use crate::snapshot::{KeyValue, Row};

use super::errors::{RestoreError, RestoreResult};
use super::validator::{key_of, referenced_kinds};

/// Positions of `rows` in insert order.
///
/// Tables without self-references keep snapshot order. A reference that
/// matches no row is ignored here; `verify_references` reports it.
pub fn order_rows(table: &TableDescriptor, rows: &[Row]) -> RestoreResult<Vec<usize>> {
    if !table.is_self_referencing() {
        return Ok((0..rows.len()).collect());
    }

    let mut graph = DependencyGraph::new();
    for position in 0..rows.len() {
        graph.add_node(position);
    }

    for fk in table.self_references() {
        let kinds = referenced_kinds(Some(table), fk);
        let mut parents: HashMap<Vec<KeyValue>, usize> = HashMap::new();
        for (position, row) in rows.iter().enumerate() {
            if let Some(key) = key_of(row, &fk.referenced_columns, &kinds) {
                parents.entry(key).or_insert(position);
            }
        }

        for (position, row) in rows.iter().enumerate() {
            let parent = key_of(row, &fk.columns, &kinds).and_then(|key| parents.get(&key));
            if let Some(&parent) = parent {
                graph.add_dependency(position, parent);
            }
        }
    }

    graph
        .sort()
        .map_err(|rows| RestoreError::CircularRowReference {
            table: table.name.clone(),
            rows,
        })
}
