//! `.env` reader. Produces a key-value map; applying it to the process is done in `lib`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `dir`, or in the current directory when `dir` is `None`. `None` if absent.
fn locate(dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Strips one pair of matching surrounding quotes. Double quotes unescape `\"`.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 {
        if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return inner.replace("\\\"", "\"");
        }
        if let Some(inner) = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return inner.to_string();
        }
    }
    raw.to_string()
}

/// One `KEY=VALUE` per line. Blank lines and `#` comment lines are skipped, as are lines
/// without `=` or with an empty key. An optional leading `export ` is ignored.
pub(crate) fn parse(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(value.trim())))
        })
        .collect()
}

/// Reads `.env` from `dir` (or the current directory). A missing file is an empty map.
pub(crate) fn read(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match locate(dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_noise() {
        let map = parse(
            "\n# local overrides\nTALLY_MODEL=gpt-4o\nnot a pair\n=orphan\n  TALLY_DATABASE = shop.db  \n",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map["TALLY_MODEL"], "gpt-4o");
        assert_eq!(map["TALLY_DATABASE"], "shop.db");
    }

    #[test]
    fn unquotes_values() {
        let map = parse(
            "A=\"two words\"\nB='single'\nC=\"say \\\"hi\\\"\"\nD=\"\"\nE=\nF=keep#hash",
        );
        assert_eq!(map["A"], "two words");
        assert_eq!(map["B"], "single");
        assert_eq!(map["C"], "say \"hi\"");
        assert_eq!(map["D"], "");
        assert_eq!(map["E"], "");
        assert_eq!(map["F"], "keep#hash");
    }

    #[test]
    fn export_prefix_is_ignored() {
        let map = parse("export OPENAI_API_KEY=sk-local");
        assert_eq!(map["OPENAI_API_KEY"], "sk-local");
    }

    #[test]
    fn read_missing_and_present_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(Some(dir.path())).unwrap().is_empty());

        std::fs::write(dir.path().join(".env"), "TALLY_MAX_FAILURES=5\n").unwrap();
        let map = read(Some(dir.path())).unwrap();
        assert_eq!(map["TALLY_MAX_FAILURES"], "5");
    }
}
