//! `{name}` placeholder templates.
//!
//! `{{` and `}}` render as literal braces, so JSON examples can sit inside a prompt.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

/// Error rendering or parsing a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt variable not provided: {0}")]
    MissingVariable(String),
    #[error("malformed prompt template at byte {position}: {reason}")]
    Malformed { position: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A prompt with named placeholders. Holds no logic beyond substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            source: text.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in first-seen order, without duplicates.
    pub fn input_variables(&self) -> Result<Vec<String>, PromptError> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for seg in parse(&self.source)? {
            if let Segment::Var(name) = seg {
                if seen.insert(name.clone()) {
                    out.push(name);
                }
            }
        }
        Ok(out)
    }

    /// Substitutes every placeholder from `vars`. Extra variables are ignored.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        self.render_with(|name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        })
    }

    pub fn render_map(&self, vars: &HashMap<String, String>) -> Result<String, PromptError> {
        self.render_with(|name| vars.get(name).cloned())
    }

    fn render_with<F>(&self, lookup: F) -> Result<String, PromptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.source.len());
        for seg in parse(&self.source)? {
            match seg {
                Segment::Text(t) => out.push_str(&t),
                Segment::Var(name) => match lookup(&name) {
                    Some(v) => out.push_str(&v),
                    None => return Err(PromptError::MissingVariable(name)),
                },
            }
        }
        Ok(out)
    }
}

impl From<&str> for PromptTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn parse(src: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = src.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                text.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(PromptError::Malformed {
                        position: pos,
                        reason: "unclosed '{'".to_string(),
                    });
                }
                let name = name.trim().to_string();
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(PromptError::Malformed {
                        position: pos,
                        reason: format!("invalid placeholder name {:?}", name),
                    });
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var(name));
            }
            '}' => {
                return Err(PromptError::Malformed {
                    position: pos,
                    reason: "unmatched '}'".to_string(),
                });
            }
            c => text.push(c),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
