//! Environment snapshot used as the configuration source
//!
//! All configuration flows through an owned [`EnvMap`] so the parser and
//! registry can be driven from literal maps in tests instead of ambient
//! process state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Owned snapshot of a key/value environment namespace
#[derive(Debug, Clone, Default)]
pub struct EnvMap {
    vars: BTreeMap<String, String>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    /// Overlay a `.env` file onto this snapshot
    ///
    /// When no path is given, looks for `.env` in the current directory and
    /// up to three parent levels. Values already present in the snapshot take
    /// precedence over file entries. Returns whether a file was loaded; a
    /// missing or unreadable file is not an error.
    pub fn load_dotenv(&mut self, path: Option<&Path>) -> bool {
        let file = match path {
            Some(p) => p.to_path_buf(),
            None => match find_dotenv() {
                Some(p) => p,
                None => return false,
            },
        };

        let content = match std::fs::read_to_string(&file) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read env file {}: {}", file.display(), e);
                return false;
            }
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = strip_quotes(value.trim());
            if !self.vars.contains_key(key) {
                self.vars.insert(key.to_string(), value.to_string());
            }
        }

        tracing::debug!("Loaded environment overlay from {}", file.display());
        true
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Search the working directory and up to three parents for a `.env`
fn find_dotenv() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    for _ in 0..3 {
        let candidate = dir.join(".env");
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Remove one layer of matching single or double quotes
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_snapshot_get_set() {
        let mut env = EnvMap::new();
        env.set("KEY", "value");
        assert_eq!(env.get("KEY"), Some("value"));
        assert_eq!(env.get("MISSING"), None);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\"abc'"), "\"abc'");
    }

    #[test]
    fn test_dotenv_overlay_respects_existing() {
        let dir = std::env::temp_dir().join("dw_mcp_env_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "A=1").unwrap();
        writeln!(file, "B=\"two words\"").unwrap();
        writeln!(file, "C='x=y'").unwrap();
        writeln!(file, "not a pair").unwrap();

        let mut env: EnvMap = [("A", "existing")].into_iter().collect();
        assert!(env.load_dotenv(Some(&path)));

        // Existing values win over file entries
        assert_eq!(env.get("A"), Some("existing"));
        assert_eq!(env.get("B"), Some("two words"));
        // Split only on the first '='
        assert_eq!(env.get("C"), Some("x=y"));
        assert_eq!(env.get("not a pair"), None);
    }

    #[test]
    fn test_dotenv_missing_file() {
        let mut env = EnvMap::new();
        assert!(!env.load_dotenv(Some(Path::new("/nonexistent/.env"))));
    }
}
