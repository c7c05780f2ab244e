//! Dependency graph with deterministic Kahn ordering
//!
//! Nodes are placed only after every node they depend on. When several
//! nodes are ready at once, the smallest key goes first, so the same graph
//! always yields the same order regardless of insertion order.

use std::collections::{BTreeMap, BTreeSet};

/// Directed graph: an edge `node → dependency` means `dependency` must
/// be placed before `node`.
#[derive(Debug, Clone)]
pub struct DependencyGraph<K: Ord + Clone> {
    dependencies: BTreeMap<K, BTreeSet<K>>,
}

impl<K: Ord + Clone> DependencyGraph<K> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            dependencies: BTreeMap::new(),
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns true if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Add a node with no dependencies (no-op if present)
    pub fn add_node(&mut self, node: K) {
        self.dependencies.entry(node).or_default();
    }

    /// Record that `node` depends on `dependency`.
    ///
    /// Self-edges are ignored.
    pub fn add_dependency(&mut self, node: K, dependency: K) {
        if node == dependency {
            self.add_node(node);
            return;
        }
        self.add_node(dependency.clone());
        self.dependencies.entry(node).or_default().insert(dependency);
    }

    /// Order all nodes, dependencies first.
    ///
    /// On failure returns the nodes involved in cycles, sorted. Nodes that
    /// merely depend on a cycle are pruned from that list.
    pub fn sort(&self) -> Result<Vec<K>, Vec<K>> {
        let mut dependents: BTreeMap<&K, Vec<&K>> = BTreeMap::new();
        let mut pending: BTreeMap<&K, usize> = BTreeMap::new();

        for (node, deps) in &self.dependencies {
            pending.insert(node, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(node);
            }
        }

        let mut ready: BTreeSet<&K> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut sorted = Vec::with_capacity(self.dependencies.len());

        while let Some(node) = ready.pop_first() {
            sorted.push(node.clone());
            pending.remove(node);

            for dependent in dependents.get(node).map(Vec::as_slice).unwrap_or_default() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(sorted);
        }

        Err(self.cycle_members(pending.keys().copied().collect()))
    }

    /// Strip nodes that nothing else in `remaining` depends on, until only
    /// nodes that sit on (or between) cycles are left.
    fn cycle_members(&self, mut remaining: BTreeSet<&K>) -> Vec<K> {
        loop {
            let depended_on: BTreeSet<&K> = remaining
                .iter()
                .flat_map(|node| self.dependencies[*node].iter())
                .filter(|dep| remaining.contains(dep))
                .collect();

            let before = remaining.len();
            remaining.retain(|node| depended_on.contains(node));
            if remaining.len() == before {
                break;
            }
        }

        remaining.into_iter().cloned().collect()
    }
}

impl<K: Ord + Clone> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let graph: DependencyGraph<String> = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.sort().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_dependencies_first() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("c", "b");
        graph.add_dependency("b", "a");

        assert_eq!(graph.sort().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let mut graph = DependencyGraph::new();
        graph.add_node("zeta");
        graph.add_node("alpha");
        graph.add_dependency("beta", "zeta");

        assert_eq!(graph.sort().unwrap(), vec!["alpha", "zeta", "beta"]);
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut first = DependencyGraph::new();
        first.add_dependency("d", "c");
        first.add_dependency("c", "a");
        first.add_dependency("c", "b");

        let mut second = DependencyGraph::new();
        second.add_dependency("c", "b");
        second.add_dependency("c", "a");
        second.add_dependency("d", "c");

        assert_eq!(first.sort().unwrap(), second.sort().unwrap());
    }

    #[test]
    fn test_self_edge_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(1usize, 1usize);
        assert_eq!(graph.sort().unwrap(), vec![1]);
    }

    #[test]
    fn test_cycle_reports_only_members() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");
        // depends on the cycle but is not part of it
        graph.add_dependency("c", "a");
        graph.add_node("d");

        assert_eq!(graph.sort().unwrap_err(), vec!["a", "b"]);
    }
}
