use std::collections::{HashMap, VecDeque};

use petgraph::stable_graph::NodeIndex;

use crate::graph::LibraryGraph;
use crate::index::FileId;

use super::EdgeSource;

/// Result of ordering logical libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryOrder {
    /// Libraries with every dependency listed before its dependents, or the
    /// insertion-order listing when a cycle prevented that.
    pub libraries: Vec<String>,
    /// Libraries left over when a cycle stopped the sort, in insertion order.
    pub cycle: Option<Vec<String>>,
}

/// Derive the library graph from the direct edges of every file in `files`.
///
/// Libraries are added in the order their files appear; include files (no
/// library) contribute nothing. Only edges whose endpoints sit in different
/// libraries become library dependencies.
pub fn build_library_graph<E: EdgeSource>(files: &[FileId], edges: &mut E) -> LibraryGraph {
    let mut graph = LibraryGraph::new();

    for &file in files {
        if let Some(library) = edges.library(file) {
            graph.add_library(&library);
        }
    }

    for &file in files {
        let Some(from) = edges.library(file) else {
            continue;
        };
        for dep in edges.dependencies(file) {
            if let Some(to) = edges.library(dep) {
                graph.add_dependency(&from, &to);
            }
        }
    }

    graph
}

/// Kahn's algorithm over `graph`.
///
/// A library is ready once every library it depends on has been emitted;
/// ready libraries are taken in insertion order. If some libraries never
/// become ready they form a cycle: it is reported and the plain insertion
/// order is returned instead.
pub fn order_libraries(graph: &LibraryGraph) -> LibraryOrder {
    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    let mut pending: HashMap<NodeIndex, usize> = nodes
        .iter()
        .map(|&n| (n, graph.dependency_count(n)))
        .collect();

    let mut queue: VecDeque<NodeIndex> = nodes
        .iter()
        .copied()
        .filter(|n| pending[n] == 0)
        .collect();

    let mut ordered: Vec<NodeIndex> = Vec::with_capacity(graph.library_count());
    while let Some(node) = queue.pop_front() {
        ordered.push(node);
        for dependent in graph.dependents(node) {
            if let Some(count) = pending.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    let name = |n: NodeIndex| graph.graph[n].clone();

    if ordered.len() < graph.library_count() {
        let stuck = nodes
            .iter()
            .copied()
            .filter(|n| pending[n] > 0)
            .map(name)
            .collect();
        return LibraryOrder {
            libraries: nodes.into_iter().map(name).collect(),
            cycle: Some(stuck),
        };
    }

    LibraryOrder {
        libraries: ordered.into_iter().map(name).collect(),
        cycle: None,
    }
}
