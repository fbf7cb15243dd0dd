//! `graph`: print a demo graph as Graphviz DOT or Mermaid. No model is contacted.

use std::fmt::Debug;
use std::sync::Arc;

use switchyard::agent::codegen::{build_codegen_graph, LocalPythonExecutor, DEFAULT_MAX_ATTEMPTS};
use switchyard::agent::demos::{build_branch_graph, build_chain_graph, build_joke_loop, DEFAULT_CHAIN_SUFFIX};
use switchyard::agent::dispatch::build_dispatch_graph;
use switchyard::agent::router_loop::{build_router_loop_graph, RouterLoopOptions};
use switchyard::agent::tool_calling::build_tool_calling_graph;
use switchyard::{
    builtin_registry, generate_dot, generate_mermaid, LlmClient, MockLlm, PromptSet, StateGraph,
    ToolSpec,
};

use super::RunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GraphName {
    Chain,
    Branch,
    Jokes,
    CallTools,
    RouterLoop,
    Dispatch,
    Codegen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GraphFormat {
    #[default]
    Dot,
    Mermaid,
}

fn render<S>(graph: StateGraph<S>, format: GraphFormat) -> Result<String, RunError>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let compiled = graph.compile()?;
    Ok(match format {
        GraphFormat::Dot => generate_dot(&compiled),
        GraphFormat::Mermaid => generate_mermaid(&compiled),
    })
}

/// Renders the named graph with a placeholder model and the builtin tools.
pub fn graph_text(name: GraphName, format: GraphFormat) -> Result<String, RunError> {
    let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::default());
    let prompts = Arc::new(PromptSet::default());
    let registry = Arc::new(builtin_registry());
    match name {
        GraphName::Chain => render(build_chain_graph([DEFAULT_CHAIN_SUFFIX; 4]), format),
        GraphName::Branch => render(build_branch_graph(), format),
        GraphName::Jokes => render(build_joke_loop(llm, prompts, 3), format),
        GraphName::CallTools => render(build_tool_calling_graph(llm, registry), format),
        GraphName::RouterLoop => render(
            build_router_loop_graph(llm, registry, prompts, RouterLoopOptions::default()),
            format,
        ),
        GraphName::Dispatch => {
            let bound = llm.clone();
            render(
                build_dispatch_graph(llm, move |_: Vec<ToolSpec>| bound.clone(), registry, prompts),
                format,
            )
        }
        GraphName::Codegen => render(
            build_codegen_graph(
                llm,
                prompts,
                Arc::new(LocalPythonExecutor::default()),
                DEFAULT_MAX_ATTEMPTS,
            ),
            format,
        ),
    }
}

pub fn run_graph(name: GraphName, format: GraphFormat) -> Result<String, RunError> {
    let text = graph_text(name, format)?;
    print!("{}", text);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn every_graph_renders_in_both_formats() {
        for name in GraphName::value_variants() {
            let dot = graph_text(*name, GraphFormat::Dot).unwrap();
            assert!(dot.starts_with("digraph {"), "{:?}: {}", name, dot);
            let mermaid = graph_text(*name, GraphFormat::Mermaid).unwrap();
            assert!(mermaid.starts_with("graph TD;"), "{:?}: {}", name, mermaid);
        }
    }

    #[test]
    fn router_loop_dot_has_dashed_verdict_edges() {
        let dot = graph_text(GraphName::RouterLoop, GraphFormat::Dot).unwrap();
        assert!(dot.contains("\"evaluate\" -> \"agent\" [style=dashed, label=\"continue\"]"), "{}", dot);
        assert!(dot.contains("\"action\" -> \"evaluate\";"), "{}", dot);
    }
}
