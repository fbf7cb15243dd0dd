//! Model-backed agents: `call-tools`, `router-loop`, `agent-loop`, `dispatch`, `evaluate`.

use std::sync::Arc;

use crossterm::style::Stylize;
use switchyard::agent::dispatch::{build_dispatch_graph, DispatchState, DEFAULT_QUERIES};
use switchyard::agent::router_loop::{build_router_loop_graph, RouterLoop, RouterLoopOptions, RouterState};
use switchyard::agent::tool_calling::{build_tool_calling_graph, ChatState};
use switchyard::agent::Evaluator;
use switchyard::{builtin_registry, build_client, AgentError, LlmClient, ToolSpec, WeatherEvaluation};

use super::display::format_message_truncated;
use super::{RunError, RunOptions};

fn print_evaluation(eval: &WeatherEvaluation) {
    let verdict = if eval.result {
        "answered".green().bold()
    } else {
        "not answered".red().bold()
    };
    println!("{} ({})", verdict, eval.temperature_tone.as_str());
    println!("{}", eval.explanation);
}

/// Message-list tool loop: the model calls tools until it answers in text.
pub async fn run_call_tools(opts: &RunOptions, question: &str) -> Result<ChatState, RunError> {
    let settings = opts.settings()?;
    let prompts = opts.prompts();
    let registry = Arc::new(builtin_registry());
    let llm = build_client(&settings, registry.list());
    let graph = opts
        .observe(build_tool_calling_graph(llm, registry))?
        .compile()?;
    let system = prompts.tool_system.render(&[]).map_err(AgentError::from)?;
    let state = graph
        .invoke(ChatState::new(system, question), Some(opts.run_config(&settings)))
        .await?;
    if opts.verbose {
        for m in &state.messages {
            println!("{}", format_message_truncated(m, opts.display_max_len));
        }
    }
    println!("{}", state.final_answer().unwrap_or_default());
    println!("{}", format!("tool calls: {}", state.api_call_count).dim());
    Ok(state)
}

fn router_loop(
    opts: &RunOptions,
    max_agent_calls: usize,
) -> Result<RouterLoop, RunError> {
    let settings = opts.settings()?;
    let registry = Arc::new(builtin_registry());
    let llm = build_client(&settings, registry.list());
    let options = RouterLoopOptions {
        max_agent_calls,
        recursion_limit: settings.recursion_limit,
    };
    let graph = opts.observe(build_router_loop_graph(llm, registry, opts.prompts(), options))?;
    Ok(RouterLoop::from_graph(graph, options)?)
}

/// agent → tool → evaluate loop; prints the final tool response and the counters.
pub async fn run_router_loop(
    opts: &RunOptions,
    question: &str,
    max_agent_calls: usize,
) -> Result<RouterState, RunError> {
    let state = router_loop(opts, max_agent_calls)?.run(question).await?;
    println!("{}", state.tool_response);
    println!(
        "{}",
        format!(
            "agent calls: {}, tool calls: {}",
            state.agent_call_count, state.tool_call_count
        )
        .dim()
    );
    if let Some(err) = &state.last_tool_error {
        println!("{} {}", "last tool error:".yellow(), err);
    }
    Ok(state)
}

/// Router loop, then a weather evaluation of its final answer.
///
/// An evaluation the model cannot format is reported and skipped, not raised.
pub async fn run_agent_loop(
    opts: &RunOptions,
    question: &str,
    max_agent_calls: usize,
) -> Result<(RouterState, Option<WeatherEvaluation>), RunError> {
    let state = run_router_loop(opts, question, max_agent_calls).await?;
    let settings = opts.settings()?;
    let evaluator = Evaluator::new(build_client(&settings, Vec::new()), opts.prompts());
    let eval = match evaluator
        .judge::<WeatherEvaluation>(question, &state.tool_response)
        .await
    {
        Ok(eval) => {
            print_evaluation(&eval);
            Some(eval)
        }
        Err(AgentError::StructuredOutput(e)) => {
            tracing::warn!(error = %e, "weather evaluation unparseable");
            println!("{}", "evaluation unavailable".yellow());
            None
        }
        Err(e) => return Err(e.into()),
    };
    Ok((state, eval))
}

/// Classifies each query and answers with the basic or a tool-bound specialized agent.
pub async fn run_dispatch(
    opts: &RunOptions,
    queries: Vec<String>,
) -> Result<Vec<DispatchState>, RunError> {
    let settings = opts.settings()?;
    let registry = Arc::new(builtin_registry());
    let llm = build_client(&settings, Vec::new());
    let bind_settings = settings.clone();
    let bind_llm = move |tools: Vec<ToolSpec>| -> Arc<dyn LlmClient> { build_client(&bind_settings, tools) };
    let graph = opts
        .observe(build_dispatch_graph(llm, bind_llm, registry, opts.prompts()))?
        .compile()?;

    let queries = if queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        queries
    };
    let mut states = Vec::with_capacity(queries.len());
    for query in queries {
        let state = graph
            .invoke(DispatchState::new(query), Some(opts.run_config(&settings)))
            .await?;
        println!("{} {}", "query:".bold(), state.query);
        println!(
            "{} {}",
            "agent:".bold(),
            state.agent_used.as_deref().unwrap_or("none")
        );
        println!("{}\n", state.response.trim());
        states.push(state);
    }
    Ok(states)
}

/// Judges `response` against `request` and prints the weather evaluation.
pub async fn run_evaluate(
    opts: &RunOptions,
    request: &str,
    response: &str,
) -> Result<WeatherEvaluation, RunError> {
    let settings = opts.settings()?;
    let evaluator = Evaluator::new(build_client(&settings, Vec::new()), opts.prompts());
    let eval = evaluator.judge::<WeatherEvaluation>(request, response).await?;
    print_evaluation(&eval);
    Ok(eval)
}
