//! Prompt set: embedded YAML defaults with an optional override file.
//!
//! Default text lives in `switchyard/prompts/default.yaml` and is embedded at compile time.
//! An override file only needs the keys it changes.

use std::path::Path;

use serde::Deserialize;

use super::PromptTemplate;

const EMBED_DEFAULT: &str = include_str!("../../prompts/default.yaml");

/// Env var naming a YAML override file for [`PromptSet::load_or_default`].
pub const ENV_PROMPTS_FILE: &str = "SWITCHYARD_PROMPTS_FILE";

/// Error when loading a prompts file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
}

/// On-disk shape; every key optional so partial overrides parse.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptsFile {
    tool_system: Option<String>,
    agent: Option<String>,
    evaluation: Option<String>,
    weather_evaluation: Option<String>,
    routing: Option<String>,
    basic_answer: Option<String>,
    specialized: Option<String>,
    preprocess: Option<String>,
    code_generation: Option<String>,
    code_review: Option<String>,
    joke: Option<String>,
}

/// Every template the agents render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System message for the message-list tool loop. No placeholders.
    pub tool_system: PromptTemplate,
    /// `{question}`
    pub agent: PromptTemplate,
    /// `{question}`, `{response}`; expects `Evaluation` JSON back.
    pub evaluation: PromptTemplate,
    /// `{question}`, `{response}`; expects `WeatherEvaluation` JSON back.
    pub weather_evaluation: PromptTemplate,
    /// `{query}`; expects `RouterDecision` JSON back.
    pub routing: PromptTemplate,
    /// `{query}`
    pub basic_answer: PromptTemplate,
    /// `{query}`
    pub specialized: PromptTemplate,
    /// `{request}`
    pub preprocess: PromptTemplate,
    /// `{task}`, `{feedback}`
    pub code_generation: PromptTemplate,
    /// `{task}`, `{code}`; expects `CodeReview` JSON back.
    pub code_review: PromptTemplate,
    /// `{topic}`, `{previous}`
    pub joke: PromptTemplate,
}

impl PromptSet {
    fn from_file(file: PromptsFile, base: &PromptSet) -> PromptSet {
        let pick = |v: Option<String>, d: &PromptTemplate| v.map(PromptTemplate::new).unwrap_or_else(|| d.clone());
        PromptSet {
            tool_system: pick(file.tool_system, &base.tool_system),
            agent: pick(file.agent, &base.agent),
            evaluation: pick(file.evaluation, &base.evaluation),
            weather_evaluation: pick(file.weather_evaluation, &base.weather_evaluation),
            routing: pick(file.routing, &base.routing),
            basic_answer: pick(file.basic_answer, &base.basic_answer),
            specialized: pick(file.specialized, &base.specialized),
            preprocess: pick(file.preprocess, &base.preprocess),
            code_generation: pick(file.code_generation, &base.code_generation),
            code_review: pick(file.code_review, &base.code_review),
            joke: pick(file.joke, &base.joke),
        }
    }

    fn empty() -> PromptSet {
        let e = PromptTemplate::new("");
        PromptSet {
            tool_system: e.clone(),
            agent: e.clone(),
            evaluation: e.clone(),
            weather_evaluation: e.clone(),
            routing: e.clone(),
            basic_answer: e.clone(),
            specialized: e.clone(),
            preprocess: e.clone(),
            code_generation: e.clone(),
            code_review: e.clone(),
            joke: e,
        }
    }

    /// Parses a YAML document over `self`: keys present replace, keys absent keep.
    pub fn merge_yaml(&self, yaml: &str, origin: &str) -> Result<PromptSet, LoadError> {
        let file: PromptsFile = serde_yaml::from_str(yaml).map_err(|e| LoadError::ParseYaml {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_file(file, self))
    }

    /// Loads an override file on top of the embedded defaults.
    pub fn load(path: &Path) -> Result<PromptSet, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::ReadFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        PromptSet::default().merge_yaml(&content, &path.display().to_string())
    }

    /// Uses `path`, else `SWITCHYARD_PROMPTS_FILE`, else the embedded defaults.
    ///
    /// A file that fails to load is logged and the defaults are used.
    pub fn load_or_default(path: Option<&Path>) -> PromptSet {
        let from_env = std::env::var(ENV_PROMPTS_FILE).ok().filter(|s| !s.is_empty());
        let chosen = path
            .map(Path::to_path_buf)
            .or_else(|| from_env.map(Into::into));
        match chosen {
            Some(p) => PromptSet::load(&p).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "prompts file not usable, using defaults");
                PromptSet::default()
            }),
            None => PromptSet::default(),
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        match Self::empty().merge_yaml(EMBED_DEFAULT, "default.yaml") {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(error = %e, "embedded prompts failed to parse");
                Self::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_defaults_cover_every_template() {
        let set = PromptSet::default();
        assert!(set.agent.input_variables().unwrap().contains(&"question".to_string()));
        assert_eq!(
            set.evaluation.input_variables().unwrap(),
            vec!["question", "response"]
        );
        assert_eq!(set.code_review.input_variables().unwrap(), vec!["task", "code"]);
        assert_eq!(set.joke.input_variables().unwrap(), vec!["topic", "previous"]);
        assert!(set.tool_system.input_variables().unwrap().is_empty());
        assert!(!set.routing.source().is_empty());
    }

    #[test]
    fn override_file_keeps_missing_keys() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "agent: \"Just answer: {{question}}\"").unwrap();
        let set = PromptSet::load(f.path()).unwrap();
        assert_eq!(set.agent.source(), "Just answer: {question}");
        assert_eq!(set.evaluation, PromptSet::default().evaluation);
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = PromptSet::default().merge_yaml("agnet: x\n", "inline").unwrap_err();
        assert!(matches!(err, LoadError::ParseYaml { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let set = PromptSet::load_or_default(Some(Path::new("/nonexistent/prompts.yaml")));
        assert_eq!(set, PromptSet::default());
    }
}
