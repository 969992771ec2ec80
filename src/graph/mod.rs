pub mod edge;
pub mod node;

use std::collections::HashMap;

use petgraph::Directed;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableGraph};

use edge::EdgeKind;
use node::FileNode;

use crate::index::FileId;

/// Directed graph of logical libraries. An edge `a -> b` means library `a`
/// depends on library `b` (some file in `a` references a unit in `b`).
pub struct LibraryGraph {
    pub graph: StableGraph<String, (), Directed>,
    /// Library name -> node, for O(1) lookup.
    pub library_index: HashMap<String, NodeIndex>,
}

impl LibraryGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            library_index: HashMap::new(),
        }
    }

    /// Add a library node, returning the existing node if already present.
    pub fn add_library(&mut self, name: &str) -> NodeIndex {
        if let Some(&existing) = self.library_index.get(name) {
            return existing;
        }
        let idx = self.graph.add_node(name.to_string());
        self.library_index.insert(name.to_string(), idx);
        idx
    }

    /// Record that `from` depends on `to`. Self-dependencies and duplicate edges are ignored.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let a = self.add_library(from);
        let b = self.add_library(to);
        if !self.graph.contains_edge(a, b) {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn library_count(&self) -> usize {
        self.library_index.len()
    }

    /// Libraries that directly depend on `idx`, in node order.
    pub fn dependents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        out.sort();
        out
    }

    /// Number of distinct libraries `idx` depends on.
    pub fn dependency_count(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .count()
    }
}

impl Default for LibraryGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// The resolved file dependency graph, kept for export.
pub struct FileGraph {
    pub graph: StableGraph<FileNode, EdgeKind, Directed>,
    /// Maps file ids to their node indices for O(1) lookup.
    pub file_index: HashMap<FileId, NodeIndex>,
}

impl FileGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            file_index: HashMap::new(),
        }
    }

    /// Add a file node. If the file has already been added, returns the existing index.
    pub fn add_file(&mut self, id: FileId, node: FileNode) -> NodeIndex {
        if let Some(&existing) = self.file_index.get(&id) {
            return existing;
        }
        let idx = self.graph.add_node(node);
        self.file_index.insert(id, idx);
        idx
    }

    /// Add a dependency edge between two files already in the graph.
    pub fn add_dependency(&mut self, from: FileId, to: FileId, kind: EdgeKind) {
        if let (Some(&a), Some(&b)) = (self.file_index.get(&from), self.file_index.get(&to)) {
            self.graph.add_edge(a, b, kind);
        }
    }

    /// Record a dependency that was dropped to break a cycle.
    pub fn add_cycle_edge(&mut self, from: FileId, to: FileId) {
        self.add_dependency(from, to, EdgeKind::CycleBreak);
    }

    pub fn file_count(&self) -> usize {
        self.file_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for FileGraph {
    fn default() -> Self {
        Self::new()
    }
}
