use std::collections::BTreeMap;
use std::fmt::Write;

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::graph::FileGraph;
use crate::graph::edge::EdgeKind;

/// Sanitize a string for use as a DOT node ID or subgraph name.
///
/// Replaces non-alphanumeric characters with `_`. Prepends `n` if the result
/// starts with a digit (DOT IDs must not start with a digit).
pub fn sanitize_dot_id(s: &str) -> String {
    let mut result: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'n');
    }
    if result.is_empty() {
        result = "node".to_string();
    }
    result
}

/// DOT edge style attributes for a given EdgeKind.
fn edge_style(kind: &EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Unit => "style=solid",
        EdgeKind::Include => "style=dotted",
        EdgeKind::CycleBreak => "style=dashed color=red",
    }
}

/// Render the resolved file graph as DOT, one cluster per logical library.
///
/// Include files sit outside every cluster. Edges point from a file to what it
/// depends on; dropped cycle edges are drawn dashed red.
pub fn render_dot(graph: &FileGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph hdl_order {{");
    let _ = writeln!(out, "    rankdir=BT;");
    let _ = writeln!(out, "    node [shape=box style=filled fillcolor=\"#EAECEE\" fontname=monospace];");

    // Library -> nodes, sorted by library so the output is stable.
    let mut clusters: BTreeMap<&str, Vec<NodeIndex>> = BTreeMap::new();
    let mut loose: Vec<NodeIndex> = Vec::new();
    for idx in graph.graph.node_indices() {
        match &graph.graph[idx].library {
            Some(lib) => clusters.entry(lib.as_str()).or_default().push(idx),
            None => loose.push(idx),
        }
    }

    let node_id = |idx: NodeIndex| sanitize_dot_id(&graph.graph[idx].relative);

    for (i, (library, nodes)) in clusters.iter().enumerate() {
        let label = if library.is_empty() { "work" } else { *library };
        let _ = writeln!(out, "    subgraph cluster_{i} {{");
        let _ = writeln!(out, "        label=\"{label}\";");
        for &idx in nodes {
            let _ = writeln!(
                out,
                "        {} [label=\"{}\"];",
                node_id(idx),
                graph.graph[idx].relative
            );
        }
        let _ = writeln!(out, "    }}");
    }

    for &idx in &loose {
        let _ = writeln!(
            out,
            "    {} [label=\"{}\" fillcolor=\"#FDFEFE\" shape=note];",
            node_id(idx),
            graph.graph[idx].relative
        );
    }

    for edge in graph.graph.edge_references() {
        let _ = writeln!(
            out,
            "    {} -> {} [{}];",
            node_id(edge.source()),
            node_id(edge.target()),
            edge_style(edge.weight())
        );
    }

    let _ = writeln!(out, "}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::FileNode;
    use crate::index::FileId;

    #[test]
    fn test_sanitize_dot_id() {
        assert_eq!(sanitize_dot_id("rtl/fifo.vhd"), "rtl_fifo_vhd");
        assert_eq!(sanitize_dot_id("2x.v"), "n2x_v");
        assert_eq!(sanitize_dot_id(""), "node");
    }

    #[test]
    fn test_render_dot_clusters_and_edges() {
        let mut g = FileGraph::new();
        g.add_file(
            FileId(0),
            FileNode {
                relative: "inc/defs.vh".into(),
                library: None,
            },
        );
        g.add_file(
            FileId(1),
            FileNode {
                relative: "q/base.vhd".into(),
                library: Some("q".into()),
            },
        );
        g.add_file(
            FileId(2),
            FileNode {
                relative: "top.v".into(),
                library: Some(String::new()),
            },
        );
        g.add_dependency(FileId(2), FileId(1), EdgeKind::Unit);
        g.add_dependency(FileId(2), FileId(0), EdgeKind::Include);
        g.add_cycle_edge(FileId(1), FileId(2));

        let dot = render_dot(&g);
        assert!(dot.starts_with("digraph hdl_order {"));
        assert!(dot.contains("label=\"work\";"));
        assert!(dot.contains("label=\"q\";"));
        assert!(dot.contains("inc_defs_vh [label=\"inc/defs.vh\" fillcolor=\"#FDFEFE\" shape=note];"));
        assert!(dot.contains("top_v -> q_base_vhd [style=solid];"));
        assert!(dot.contains("top_v -> inc_defs_vh [style=dotted];"));
        assert!(dot.contains("q_base_vhd -> top_v [style=dashed color=red];"));
    }
}
