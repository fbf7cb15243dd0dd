//! Pulls runnable code out of a model reply.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Where the extracted code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// ```` ``` ```` block with no language tag.
    Fenced,
    /// ```` ```python ```` block.
    PythonFence,
    /// Single-backtick span.
    InlineCode,
    /// No backticks; the reply itself looked like code.
    WholeText,
    Failed,
}

impl Extraction {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Extraction::Failed)
    }
}
// group 1 is the rest of the opening line: a language tag or the first line of code
// tag is whatever follows the opening fence on its line
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([^\n`]*)\n?(.*?)```").expect("valid fence regex"));
static INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)`([^`]+)`").expect("valid inline code regex"));

const CODE_MARKERS: [&str; 8] = [
    "print(", "def ", "import ", "return ", "for ", "while ", "class ", " = ",
];

fn looks_like_code(text: &str) -> bool {
    CODE_MARKERS.iter().any(|m| text.contains(m))
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.'))
}

/// Splits one fence capture into `(tag, body)`; a first line that is not a bare word is code.
fn split_fence(first_line: &str, rest: &str) -> (String, String) {
    let first_line = first_line.trim();
    if is_language_tag(first_line) {
        (first_line.to_ascii_lowercase(), rest.trim().to_string())
    } else {
        let body = format!("{}\n{}", first_line, rest);
        (String::new(), body.trim().to_string())
    }
}

/// Extracts code from `reply`, trying fenced, python-fenced, inline, then whole text.
pub fn extract_code(reply: &str) -> (Extraction, Option<String>) {
    let fences: Vec<(String, String)> = FENCE_RE
        .captures_iter(reply)
        .map(|c| split_fence(&c[1], &c[2]))
        .filter(|(_, body)| !body.is_empty())
        .collect();

    if let Some((_, body)) = fences.iter().find(|(tag, _)| tag.is_empty()) {
        return (Extraction::Fenced, Some(body.clone()));
    }
    if let Some((_, body)) = fences
        .iter()
        .find(|(tag, _)| tag == "python" || tag == "py" || tag == "python3")
    {
        return (Extraction::PythonFence, Some(body.clone()));
    }
    if !reply.contains("```") {
        if let Some(c) = INLINE_RE.captures(reply) {
            let code = c[1].trim();
            if !code.is_empty() {
                return (Extraction::InlineCode, Some(code.to_string()));
            }
        }
        let whole = reply.trim();
        if !whole.contains('`') && looks_like_code(whole) {
            return (Extraction::WholeText, Some(whole.to_string()));
        }
    }
    (Extraction::Failed, None)
}
