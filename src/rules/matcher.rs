//! Base-name matching for rule patterns

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

use crate::config::PatternKind;

/// Case sensitivity for every pattern in the system
pub const CASE_SENSITIVE: bool = true;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: CASE_SENSITIVE,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled rule pattern
#[derive(Debug, Clone)]
pub enum Matcher {
    Glob(Pattern),
    Regex(Regex),
}

impl Matcher {
    /// Compile a pattern. The error string is the compiler's own message.
    pub fn compile(pattern: &str, kind: PatternKind) -> Result<Self, String> {
        match kind {
            PatternKind::Glob => {
                if pattern.contains(std::path::is_separator) {
                    return Err("glob patterns match base names and cannot contain a path separator"
                        .to_string());
                }
                Pattern::new(pattern)
                    .map(Matcher::Glob)
                    .map_err(|e| e.to_string())
            }
            PatternKind::Regex => RegexBuilder::new(pattern)
                .case_insensitive(!CASE_SENSITIVE)
                .build()
                .map(Matcher::Regex)
                .map_err(|e| e.to_string()),
        }
    }

    /// Check a file's base name (never a full path)
    pub fn matches(&self, file_name: &str) -> bool {
        // A base name never holds a separator; anything that does cannot match.
        if file_name.contains(std::path::is_separator) {
            return false;
        }
        match self {
            Matcher::Glob(p) => p.matches_with(file_name, GLOB_OPTIONS),
            Matcher::Regex(r) => r.is_match(file_name),
        }
    }
}

/// Compile and test in one step. Malformed patterns never match.
pub fn matches(file_name: &str, pattern: &str) -> bool {
    Matcher::compile(pattern, PatternKind::Glob)
        .map(|m| m.matches(file_name))
        .unwrap_or(false)
}
