//! Reads `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Two tables are understood:
//!
//! ```toml
//! [env]
//! OPENAI_API_KEY = "sk-..."
//!
//! [llm]
//! backend = "ollama"
//! model = "llama3"
//! base_url = "http://localhost:11434"
//! ```
//!
//! `[llm]` keys are translated to their env names; an explicit `[env]` entry wins over them.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::settings::{ENV_BACKEND, ENV_BASE_URL, ENV_MODEL, ENV_TEMPERATURE};
use crate::LoadError;

fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .ok_or_else(|| LoadError::XdgPath("home directory not found".to_string()))
}

fn config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
struct LlmTable {
    backend: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    llm: Option<LlmTable>,
}

impl ConfigFile {
    fn into_env_map(self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        if let Some(llm) = self.llm {
            let pairs = [
                (ENV_BACKEND, llm.backend),
                (ENV_MODEL, llm.model),
                (ENV_BASE_URL, llm.base_url),
                (ENV_TEMPERATURE, llm.temperature.map(|t| t.to_string())),
            ];
            for (key, value) in pairs {
                if let Some(v) = value {
                    out.insert(key.to_string(), v);
                }
            }
        }
        out.extend(self.env);
        out
    }
}

/// Env key/value pairs from the app's `config.toml`. Missing file gives an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = config_path(app_name)? else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let file: ConfigFile = toml::from_str(&content)?;
    Ok(file.into_env_map())
}
