//! Switchyard CLI binary: run the demo graphs, the agent loops and the function-calling suite.
//!
//! Global flags override the environment (see `config`); each subcommand maps to one
//! `cli::run_*` function.

mod log_format;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use cli::{ExecutorKind, GraphFormat, GraphName, RunError, RunOptions, ToolShowFormat};
use switchyard::agent::codegen::{DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST};
use switchyard::agent::demos::DEFAULT_JOKE_TOPIC;
use switchyard::agent::router_loop::DEFAULT_MAX_AGENT_CALLS;
use switchyard::suite::DEFAULT_SUITE_SIZE;

#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Switchyard: state-graph agents over a local or OpenAI-compatible model")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Model name (overrides MODEL)
    #[arg(long, global = true, value_name = "NAME")]
    model: Option<String>,

    /// Model endpoint (overrides SWITCHYARD_BASE_URL / OLLAMA_HOST / OPENAI_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// ollama or openai (overrides SWITCHYARD_BACKEND)
    #[arg(long, global = true, value_name = "BACKEND")]
    backend: Option<String>,

    /// Max node executions per run
    #[arg(long, global = true, value_name = "N")]
    recursion_limit: Option<usize>,

    /// YAML file overriding the builtin prompts
    #[arg(long, global = true, value_name = "FILE")]
    prompts: Option<PathBuf>,

    /// Print state after every node
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Wait for Enter after every node (implies --verbose)
    #[arg(long, global = true)]
    step: bool,

    /// Append state after every node to FILE
    #[arg(long, global = true, value_name = "FILE")]
    transcript: Option<PathBuf>,

    /// Max chars per string when printing state
    #[arg(long, global = true, value_name = "N", default_value_t = cli::run::DEFAULT_DISPLAY_MAX_LEN)]
    max_display_len: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Linear chain of append nodes
    Chain {
        /// Starting text (default "AI is")
        #[arg(long)]
        input: Option<String>,
        /// Number of append nodes
        #[arg(long, default_value_t = 4)]
        count: usize,
    },
    /// Conditional branch on whether the input mentions "human"
    Branch {
        input: String,
    },
    /// Ask the model for jokes until MAX are collected
    Jokes {
        #[arg(long, default_value = DEFAULT_JOKE_TOPIC)]
        topic: String,
        #[arg(long, default_value_t = 3)]
        max: usize,
    },
    /// Message-list tool calling until the model answers in text
    CallTools {
        question: String,
    },
    /// Router loop followed by a weather evaluation of its answer
    AgentLoop {
        question: String,
        #[arg(long, default_value_t = DEFAULT_MAX_AGENT_CALLS)]
        max_agent_calls: usize,
    },
    /// agent -> tool -> evaluate loop
    RouterLoop {
        question: String,
        #[arg(long, default_value_t = DEFAULT_MAX_AGENT_CALLS)]
        max_agent_calls: usize,
    },
    /// Classify each query and answer with the matching agent
    Dispatch {
        /// Queries (default: a builtin sample)
        queries: Vec<String>,
    },
    /// Judge a response to a weather request
    Evaluate {
        request: String,
        response: String,
    },
    /// Generate, review and run a Python program
    Codegen {
        #[arg(default_value = DEFAULT_REQUEST)]
        request: String,
        #[arg(long, value_enum, default_value_t = ExecutorKind::Docker)]
        executor: ExecutorKind,
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: usize,
        /// Execution timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
    },
    /// Measure how often the model answers with a function call
    Suite {
        #[arg(long, default_value_t = DEFAULT_SUITE_SIZE)]
        size: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Write the JSON report to FILE
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print a demo graph as DOT or Mermaid
    Graph {
        #[arg(value_enum)]
        name: GraphName,
        #[arg(long, value_enum, default_value_t = GraphFormat::Dot)]
        format: GraphFormat,
    },
    /// List or show the builtin tools
    Tools {
        #[command(subcommand)]
        sub: ToolsSub,
    },
}

#[derive(Subcommand, Debug)]
enum ToolsSub {
    /// List tool names and descriptions
    List {
        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show one tool definition
    Show {
        name: String,
        #[arg(long, value_enum, default_value_t = ToolShowFormat::Yaml)]
        output: ToolShowFormat,
    },
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            backend: self.backend.clone(),
            recursion_limit: self.recursion_limit,
            prompts: self.prompts.clone(),
            verbose: self.verbose,
            step: self.step,
            transcript: self.transcript.clone(),
            display_max_len: self.max_display_len,
        }
    }
}

async fn dispatch(args: Args) -> Result<(), RunError> {
    let opts = args.run_options();
    match args.cmd {
        Command::Chain { input, count } => {
            cli::run_chain(&opts, input, count).await?;
        }
        Command::Branch { input } => {
            cli::run_branch(&opts, &input).await?;
        }
        Command::Jokes { topic, max } => {
            cli::run_jokes(&opts, &topic, max).await?;
        }
        Command::CallTools { question } => {
            cli::run_call_tools(&opts, &question).await?;
        }
        Command::AgentLoop {
            question,
            max_agent_calls,
        } => {
            cli::run_agent_loop(&opts, &question, max_agent_calls).await?;
        }
        Command::RouterLoop {
            question,
            max_agent_calls,
        } => {
            cli::run_router_loop(&opts, &question, max_agent_calls).await?;
        }
        Command::Dispatch { queries } => {
            cli::run_dispatch(&opts, queries).await?;
        }
        Command::Evaluate { request, response } => {
            cli::run_evaluate(&opts, &request, &response).await?;
        }
        Command::Codegen {
            request,
            executor,
            max_attempts,
            timeout_secs,
        } => {
            cli::run_codegen(
                &opts,
                &request,
                executor,
                max_attempts,
                timeout_secs.map(Duration::from_secs),
            )
            .await?;
        }
        Command::Suite { size, seed, out } => {
            cli::run_suite(&opts, size, seed, out.as_deref()).await?;
        }
        Command::Graph { name, format } => {
            cli::run_graph(name, format)?;
        }
        Command::Tools { sub } => {
            let text = match sub {
                ToolsSub::List { json } => cli::list_tools(json)?,
                ToolsSub::Show { name, output } => cli::show_tool(&name, output)?,
            };
            println!("{}", text);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("switchyard", None::<&std::path::Path>).ok();
    logging::init()?;

    let args = Args::parse();
    if let Err(e) = dispatch(args).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("switchyard: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
