//! Graph visualization: DOT (Graphviz) and plain-text renderings of a compiled graph.
//!
//! Static edges are drawn solid; conditional edges are dashed and labelled with the
//! routing key. Output order is deterministic (node ids and keys are sorted).

use std::fmt::Write;

use super::compiled::CompiledStateGraph;
use super::conditional::NextEntry;
use super::state_graph::{END, START};

/// Edges of the graph as `(from, to, label)`; label is `None` for static edges.
fn collect_edges<S>(graph: &CompiledStateGraph<S>) -> Vec<(String, String, Option<String>)>
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    let mut edges = vec![(START.to_string(), graph.first_node_id.clone(), None)];
    for id in graph.node_ids() {
        match graph.next_map.get(id) {
            Some(NextEntry::Unconditional(to)) => edges.push((id.to_string(), to.clone(), None)),
            Some(NextEntry::Conditional(router)) => match router.path_map() {
                Some(map) => {
                    for (key, to) in map {
                        edges.push((id.to_string(), to.clone(), Some(key.clone())));
                    }
                }
                None => edges.push((id.to_string(), "?".to_string(), Some("dynamic".into()))),
            },
            None => {}
        }
    }
    edges
}

/// Generate a DOT format representation of the graph.
///
/// The output can be rendered with Graphviz (`dot -Tpng graph.dot -o graph.png`).
pub fn generate_dot<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    let mut dot = String::from("digraph {\n");
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=box];\n\n");
    let _ = writeln!(dot, "  \"{}\" [label=\"START\", shape=circle];", START);
    let _ = writeln!(dot, "  \"{}\" [label=\"END\", shape=doublecircle];", END);
    for node_id in graph.node_ids() {
        let _ = writeln!(dot, "  \"{}\";", node_id);
    }
    dot.push('\n');

    for (from, to, label) in collect_edges(graph) {
        match label {
            Some(label) => {
                let _ = writeln!(
                    dot,
                    "  \"{}\" -> \"{}\" [label=\"{}\", style=dashed];",
                    from, to, label
                );
            }
            None => {
                let _ = writeln!(dot, "  \"{}\" -> \"{}\";", from, to);
            }
        }
    }

    dot.push_str("}\n");
    dot
}

/// Generate a simple text representation of the graph structure.
pub fn generate_text<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    let mut text = String::new();
    let _ = writeln!(text, "Graph Structure:");
    let _ = writeln!(text, "Nodes: {}", graph.nodes.len());
    let _ = writeln!(text, "Entry: {}", graph.first_node_id);
    let _ = writeln!(text, "\nEdges:");
    for (from, to, label) in collect_edges(graph) {
        match label {
            Some(label) => {
                let _ = writeln!(text, "  {} -[{}]-> {}", from, label, to);
            }
            None => {
                let _ = writeln!(text, "  {} -> {}", from, to);
            }
        }
    }
    text
}
