//! `.env` file reader. Produces a key/value map; applying it to the process env happens in lib.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Location of `.env`: inside `dir` when given, else the current directory.
fn dotenv_path(dir: Option<&Path>) -> Option<PathBuf> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = base.join(".env");
    path.is_file().then_some(path)
}

/// Strips one pair of matching quotes. Double quotes honour `\"` and `\n`; single quotes are literal.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return raw[1..raw.len() - 1]
            .replace("\\n", "\n")
            .replace("\\\"", "\"");
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }
    // Unquoted: ` #` starts a trailing comment.
    match raw.find(" #") {
        Some(i) => raw[..i].trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// Parses `KEY=VALUE` lines. Blank lines, `#` comments and lines without `=` are skipped;
/// a leading `export ` is accepted. Later duplicates win.
pub(crate) fn parse_dotenv(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim())))
        })
        .collect()
}

/// Reads `.env` from `dir` (or the current directory). Missing file yields an empty map.
pub fn load_env_map(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match dotenv_path(dir) {
        Some(path) => Ok(parse_dotenv(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pairs_and_skips_noise() {
        let m = parse_dotenv("\n# comment\nMODEL=llama3\nNOT_A_PAIR\n=orphan\n  \nOLLAMA_HOST=http://localhost:11434\n");
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("MODEL").map(String::as_str), Some("llama3"));
        assert_eq!(
            m.get("OLLAMA_HOST").map(String::as_str),
            Some("http://localhost:11434")
        );
    }

    #[test]
    fn export_prefix_and_trailing_comment() {
        let m = parse_dotenv("export SWITCHYARD_BACKEND=ollama # local server\n");
        assert_eq!(m.get("SWITCHYARD_BACKEND").map(String::as_str), Some("ollama"));
    }

    #[test]
    fn quoted_values_keep_hash_and_spaces() {
        let m = parse_dotenv("A=\"x # not a comment\"\nB='raw \\n kept'\nC=\"say \\\"hi\\\"\"\nD=\"\"\n");
        assert_eq!(m.get("A").map(String::as_str), Some("x # not a comment"));
        assert_eq!(m.get("B").map(String::as_str), Some("raw \\n kept"));
        assert_eq!(m.get("C").map(String::as_str), Some("say \"hi\""));
        assert_eq!(m.get("D").map(String::as_str), Some(""));
    }

    #[test]
    fn later_duplicate_wins() {
        let m = parse_dotenv("MODEL=a\nMODEL=b\n");
        assert_eq!(m.get("MODEL").map(String::as_str), Some("b"));
    }

    #[test]
    fn load_env_map_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn load_env_map_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.get("A").map(String::as_str), Some("1"));
        assert_eq!(m.get("B").map(String::as_str), Some("2"));
    }
}
