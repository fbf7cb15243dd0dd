//! Graph visualization: Graphviz DOT and Mermaid flowchart text.
//!
//! Plain edges are drawn solid; conditional edges are dashed and labelled with the
//! router key. Routers without a path map get a dashed edge to a `?` placeholder.

use std::fmt::Debug;
use std::fmt::Write;

use super::conditional::NextEntry;
use super::CompiledStateGraph;
use super::{END, START};

/// One drawable edge: (from, to, route key for conditional edges).
type DrawEdge<'a> = (&'a str, &'a str, Option<&'a str>);

const DYNAMIC: &str = "?";

fn collect_edges<S>(graph: &CompiledStateGraph<S>) -> Vec<DrawEdge<'_>>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut edges: Vec<DrawEdge<'_>> = vec![(START, graph.first_node_id.as_str(), None)];
    for id in &graph.node_order {
        match graph.next_map.get(id) {
            Some(NextEntry::Unconditional(to)) => edges.push((id.as_str(), to.as_str(), None)),
            Some(NextEntry::Conditional(router)) => {
                let routes = router.routes();
                if routes.is_empty() {
                    edges.push((id.as_str(), DYNAMIC, Some("dynamic")));
                }
                edges.extend(routes.into_iter().map(|(key, to)| (id.as_str(), to, Some(key))));
            }
            None => {}
        }
    }
    edges
}

/// Graphviz DOT representation of the graph.
pub fn generate_dot<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let edges = collect_edges(graph);
    let mut dot = String::from("digraph {\n  rankdir=LR;\n  node [shape=box];\n\n");
    let _ = writeln!(dot, "  \"{}\" [label=\"START\", shape=oval];", START);
    let _ = writeln!(dot, "  \"{}\" [label=\"END\", shape=oval];", END);
    for id in &graph.node_order {
        let _ = writeln!(dot, "  \"{}\";", id);
    }
    if edges.iter().any(|(_, to, _)| *to == DYNAMIC) {
        let _ = writeln!(dot, "  \"{}\" [shape=diamond];", DYNAMIC);
    }
    dot.push('\n');
    for (from, to, key) in edges {
        match key {
            Some(key) => {
                let _ = writeln!(
                    dot,
                    "  \"{}\" -> \"{}\" [style=dashed, label=\"{}\"];",
                    from, to, key
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

/// Mermaid flowchart (`graph TD`) representation of the graph.
pub fn generate_mermaid<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let edges = collect_edges(graph);
    let mut out = String::from("graph TD;\n");
    let _ = writeln!(out, "    {}([START]):::first", START);
    for id in &graph.node_order {
        let _ = writeln!(out, "    {}({})", id, id);
    }
    let _ = writeln!(out, "    {}([END]):::last", END);
    for (from, to, key) in edges {
        let to = if to == DYNAMIC { "dynamic_route" } else { to };
        match key {
            Some(key) => {
                let _ = writeln!(out, "    {} -. {} .-> {};", from, key, to);
            }
            None => {
                let _ = writeln!(out, "    {} --> {};", from, to);
            }
        }
    }
    out.push_str("    classDef first fill-opacity:0\n    classDef last fill:#bfb6fc\n");
    out
}
