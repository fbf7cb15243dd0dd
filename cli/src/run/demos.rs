//! `chain`, `branch` and `jokes`.

use switchyard::agent::demos::{
    build_branch_graph, build_chain_graph, build_joke_loop, JokeState, DEFAULT_CHAIN_INPUT,
    DEFAULT_CHAIN_SUFFIX,
};
use switchyard::build_client;

use super::{RunError, RunOptions};

/// Runs `count` append nodes in a line over `input` (default "AI is").
pub async fn run_chain(
    opts: &RunOptions,
    input: Option<String>,
    count: usize,
) -> Result<String, RunError> {
    if count == 0 {
        return Err(RunError::InvalidArgument("--count must be at least 1".into()));
    }
    let settings = opts.settings()?;
    let graph = opts
        .observe(build_chain_graph(std::iter::repeat(DEFAULT_CHAIN_SUFFIX).take(count)))?
        .compile()?;
    let input = input.unwrap_or_else(|| DEFAULT_CHAIN_INPUT.to_string());
    let out = graph.invoke(input, Some(opts.run_config(&settings))).await?;
    println!("{}", out);
    Ok(out)
}

/// Routes `input` through the human/ai branch and the shared finish node.
pub async fn run_branch(opts: &RunOptions, input: &str) -> Result<String, RunError> {
    let settings = opts.settings()?;
    let graph = opts.observe(build_branch_graph())?.compile()?;
    let out = graph
        .invoke(input.to_string(), Some(opts.run_config(&settings)))
        .await?;
    println!("{}", out);
    Ok(out)
}

/// Asks the model for `max` jokes about `topic`, one round per joke.
///
/// The loop sizes its own recursion limit; `--recursion-limit` replaces it when given.
pub async fn run_jokes(opts: &RunOptions, topic: &str, max: usize) -> Result<JokeState, RunError> {
    let settings = opts.settings()?;
    let llm = build_client(&settings, Vec::new());
    let graph = opts
        .observe(build_joke_loop(llm, opts.prompts(), max))?
        .compile()?;
    let state = graph
        .invoke(JokeState::new(topic), opts.explicit_run_config(&settings))
        .await?;
    for (i, joke) in state.jokes.iter().enumerate() {
        println!("{}. {}", i + 1, joke.trim());
    }
    Ok(state)
}
