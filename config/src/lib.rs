//! Configuration for switchyard.
//!
//! [`load_and_apply`] merges XDG `config.toml` and a project `.env` into the process
//! environment with priority **existing env > .env > XDG**. [`LlmSettings::from_env`]
//! then resolves which endpoint and model to talk to.

mod dotenv;
mod settings;
mod xdg_toml;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

pub use settings::{
    Backend, LlmSettings, SettingsError, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL,
    DEFAULT_RECURSION_LIMIT, ENV_API_KEY, ENV_BACKEND, ENV_BASE_URL, ENV_MODEL,
    ENV_RECURSION_LIMIT, ENV_TEMPERATURE,
};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Picks the value to apply for each key missing from the process env: `.env` first, then XDG.
fn merge_missing<F>(
    dotenv: &HashMap<String, String>,
    xdg: &HashMap<String, String>,
    is_set: F,
) -> Vec<(String, String)>
where
    F: Fn(&str) -> bool,
{
    let mut out: Vec<(String, String)> = xdg
        .iter()
        .filter(|(k, _)| !dotenv.contains_key(*k))
        .chain(dotenv.iter())
        .filter(|(k, _)| !is_set(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out.sort();
    out
}

/// Loads `~/.config/<app_name>/config.toml` and `.env` (from `dotenv_dir` or the current
/// directory), then sets every key that is not already present in the environment.
///
/// Returns the keys that were applied.
pub fn load_and_apply(app_name: &str, dotenv_dir: Option<&Path>) -> Result<Vec<String>, LoadError> {
    let xdg = xdg_toml::load_env_map(app_name)?;
    let dotenv = dotenv::load_env_map(dotenv_dir).map_err(LoadError::DotenvRead)?;

    let pending = merge_missing(&dotenv, &xdg, |k| std::env::var_os(k).is_some());
    let mut applied = Vec::with_capacity(pending.len());
    for (key, value) in pending {
        std::env::set_var(&key, value);
        applied.push(key);
    }
    Ok(applied)
}
