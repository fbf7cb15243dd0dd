//! `tools` subcommand: list the builtin tools or show one definition.
//!
//! Reads the same [`builtin_registry`](switchyard::builtin_registry) the agents bind, so the
//! output matches what the model is offered.

use serde::Serialize;
use switchyard::{builtin_registry, Tool, ToolSpec};

use crate::run::{truncate_display, RunError};

/// Maximum length for description in the list table. Longer descriptions are truncated with "...".
const LIST_DESC_MAX_LEN: usize = 60;

/// Output format for `tools show`: YAML (human-readable) or JSON (machine-readable).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ToolShowFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Serialize)]
struct ToolSpecOutput<'a> {
    name: &'a str,
    description: Option<&'a str>,
    input_schema: &'a serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for ToolSpecOutput<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            name: &spec.name,
            description: spec.description.as_deref(),
            input_schema: &spec.input_schema,
        }
    }
}

/// Table of tool names and descriptions, or a JSON array when `json` is set.
pub fn list_tools(json: bool) -> Result<String, RunError> {
    let specs = builtin_registry().list();
    if json {
        let out: Vec<ToolSpecOutput<'_>> = specs.iter().map(ToolSpecOutput::from).collect();
        return serde_json::to_string_pretty(&out).map_err(|e| RunError::Serialize(e.to_string()));
    }

    let name_width = specs.iter().map(|t| t.name.len()).max().unwrap_or(4).max(4);
    let mut lines = vec![format!("{:<width$}\t{}", "NAME", "DESCRIPTION", width = name_width)];
    for spec in &specs {
        let desc = spec
            .description
            .as_deref()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("");
        lines.push(format!(
            "{:<width$}\t{}",
            spec.name,
            truncate_display(desc, LIST_DESC_MAX_LEN),
            width = name_width
        ));
    }
    Ok(lines.join("\n"))
}

/// Full definition of one tool; the name is matched ignoring case.
pub fn show_tool(name: &str, format: ToolShowFormat) -> Result<String, RunError> {
    let registry = builtin_registry();
    let tool = registry
        .get(name)
        .ok_or_else(|| RunError::ToolNotFound(name.to_string()))?;
    let spec = tool.spec();
    let out = ToolSpecOutput::from(&spec);
    match format {
        ToolShowFormat::Json => {
            serde_json::to_string_pretty(&out).map_err(|e| RunError::Serialize(e.to_string()))
        }
        ToolShowFormat::Yaml => {
            serde_yaml::to_string(&out).map_err(|e| RunError::Serialize(e.to_string()))
        }
    }
}
