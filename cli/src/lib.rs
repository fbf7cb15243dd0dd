//! Switchyard CLI library: settings resolution, run orchestration and display for the
//! `switchyard` binary.
//!
//! Each subcommand maps to one `run_*` function in [`run`]. They build the graph from
//! [`RunOptions`], attach the display/step/transcript middleware when asked, and print
//! the outcome to stdout.

pub mod run;
pub mod tool_cmd;

pub use run::{
    run_agent_loop, run_branch, run_call_tools, run_chain, run_codegen, run_dispatch,
    run_evaluate, run_graph, run_jokes, run_router_loop, run_suite, ExecutorKind, GraphFormat,
    GraphName, RunError, RunOptions,
};
pub use tool_cmd::{list_tools, show_tool, ToolShowFormat};
