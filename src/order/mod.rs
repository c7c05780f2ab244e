//! Dependency orderer
//!
//! Turns catalog foreign keys into a table order in which every table
//! follows all tables it references. Self-references are ignored here;
//! rows inside a self-referencing table are ordered at restore time.
//!
//! Ties are broken by table name, so an unchanged schema always exports
//! the same document structure.

mod errors;
mod graph;

pub use errors::{OrderError, OrderResult};
pub use graph::DependencyGraph;

use crate::catalog::TableDescriptor;

/// Order tables so referenced tables come first.
pub fn order(tables: &[TableDescriptor]) -> OrderResult<Vec<TableDescriptor>> {
    let mut graph = DependencyGraph::new();

    for table in tables {
        graph.add_node(table.name.as_str());
        for dependency in table.dependencies() {
            graph.add_dependency(table.name.as_str(), dependency);
        }
    }

    let names = graph.sort().map_err(|cycle| {
        OrderError::CircularDependency(cycle.into_iter().map(str::to_string).collect())
    })?;

    // Dependencies outside `tables` are not ours to place
    Ok(names
        .into_iter()
        .filter_map(|name| tables.iter().find(|t| t.name == name).cloned())
        .collect())
}

/// Order tables so referencing tables come first (children before
/// parents), for clearing.
pub fn teardown(tables: &[TableDescriptor]) -> OrderResult<Vec<TableDescriptor>> {
    let mut ordered = order(tables)?;
    ordered.reverse();
    Ok(ordered)
}
