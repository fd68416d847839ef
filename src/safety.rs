//! Query safety layer
//!
//! Classification is pattern-based rather than grammar-based: a destructive
//! keyword inside a string literal will be flagged. That imprecision is a
//! documented trade-off, and the checker lives behind its own type so a
//! parser-based implementation could replace it without touching callers.

use std::sync::LazyLock;

use regex::Regex;

/// Statement patterns that mutate data or schema, matched anywhere in the
/// query, case-insensitively, on word boundaries.
const DESTRUCTIVE_PATTERNS: [&str; 12] = [
    r"\bDROP\s+TABLE\b",
    r"\bDROP\s+DATABASE\b",
    r"\bDROP\s+SCHEMA\b",
    r"\bTRUNCATE\b",
    r"\bDELETE\s+FROM\b",
    r"\bUPDATE\s+\w+\s+SET\b",
    r"\bINSERT\s+INTO\b",
    r"\bCREATE\s+TABLE\b",
    r"\bCREATE\s+DATABASE\b",
    r"\bCREATE\s+SCHEMA\b",
    r"\bALTER\s+TABLE\b",
    r"\bMERGE\s+INTO\b",
];

static DESTRUCTIVE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DESTRUCTIVE_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid destructive pattern"))
        .collect()
});

/// Leading keywords that indicate a row-returning, non-mutating query
const READ_SHAPE_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Outcome of validating one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    /// Query to actually run; may carry an injected LIMIT
    pub query: String,
    pub message: String,
}

/// Pattern-based SQL safety checker
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyChecker;

impl SafetyChecker {
    /// Report whether the query matches any destructive pattern, and which
    pub fn destructive_matches(&self, query: &str) -> Vec<String> {
        DESTRUCTIVE_RES
            .iter()
            .filter_map(|re| re.find(query))
            .map(|m| m.as_str().to_uppercase())
            .collect()
    }

    pub fn is_destructive(&self, query: &str) -> bool {
        DESTRUCTIVE_RES.iter().any(|re| re.is_match(query))
    }

    /// Whether the query's leading keyword indicates it returns rows
    /// without mutating state
    pub fn is_read_shape(&self, query: &str) -> bool {
        let trimmed = query.trim_start().to_uppercase();
        READ_SHAPE_KEYWORDS
            .iter()
            .any(|keyword| trimmed.starts_with(keyword))
    }

    /// Validate a query for safety, optionally injecting a row cap
    ///
    /// Pure: never touches a backend. Accepted output re-validates to
    /// itself (an injected LIMIT is detected and never doubled).
    pub fn validate(
        &self,
        query: &str,
        allow_destructive: bool,
        auto_limit: bool,
        default_limit: u32,
    ) -> Verdict {
        if query.trim().is_empty() {
            return Verdict {
                accepted: false,
                query: query.to_string(),
                message: "Empty query".to_string(),
            };
        }

        let matches = self.destructive_matches(query);
        if !matches.is_empty() && !allow_destructive {
            return Verdict {
                accepted: false,
                query: query.to_string(),
                message: format!(
                    "Destructive operation detected: {}. This is a read-only assistant. \
                     Please confirm if you really want to execute this.",
                    matches.join(", ")
                ),
            };
        }

        let mut processed = query.to_string();
        if auto_limit && self.is_read_shape(query) {
            processed = apply_limit(&processed, default_limit);
        }

        Verdict {
            accepted: true,
            query: processed,
            message: "Query validated successfully".to_string(),
        }
    }
}

/// Append `LIMIT {cap}` unless the query already carries a LIMIT token
/// anywhere (case-insensitive substring, matching the source behavior)
pub fn apply_limit(query: &str, cap: u32) -> String {
    if query.to_uppercase().contains("LIMIT") {
        return query.to_string();
    }
    let trimmed = query.trim().trim_end_matches(';').trim_end();
    format!("{trimmed} LIMIT {cap}")
}
