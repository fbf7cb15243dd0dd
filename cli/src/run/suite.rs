//! `suite`: function-calling success rate over generated sentences.

use std::path::Path;

use crossterm::style::Stylize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use switchyard::{build_client, builtin_registry, generate_sentences, SuiteReport};

use super::{RunError, RunOptions};

/// Sends `size` sentences to the tool-bound model and writes the report to `out` when given.
pub async fn run_suite(
    opts: &RunOptions,
    size: usize,
    seed: Option<u64>,
    out: Option<&Path>,
) -> Result<SuiteReport, RunError> {
    let settings = opts.settings()?;
    let registry = builtin_registry();
    let llm = build_client(&settings, registry.list());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sentences = generate_sentences(size, &mut rng);
    tracing::info!(cases = sentences.len(), model = %settings.model, "running suite");

    let report = switchyard::run_suite(llm.as_ref(), &registry, &sentences).await;
    for (i, case) in report.cases.iter().enumerate() {
        let mark = match (&case.error, case.called_tool()) {
            (Some(_), _) => "ERR ".red(),
            (None, true) => "CALL".green(),
            (None, false) => "TEXT".yellow(),
        };
        println!("{:>3} {} {}", i + 1, mark, case.sentence);
    }
    println!(
        "{}",
        format!(
            "{}/{} with a function call ({:.1}%)",
            report.with_function_call, report.total, report.success_rate
        )
        .bold()
    );

    if let Some(path) = out {
        report.write_json(path).map_err(|source| RunError::Write {
            path: path.display().to_string(),
            source,
        })?;
        println!("report written to {}", path.display());
    }
    Ok(report)
}
