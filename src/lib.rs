//! Rulesort - move files into folders by name patterns
//!
//! A config lists rules (name, source folder, pattern, destination folder).
//! One pass runs the rules in order, moves every matching file and returns a
//! [`ResultLog`] with one record per file handled.

pub mod commands;
pub mod config;
pub mod error;
pub mod log;
pub mod organizer;
pub mod rules;
pub mod state;

pub use commands::{
    FilePicker, LastPathStore, Selection, load_config, load_last_config_path, organize_files,
    organize_files_with, select_file,
};
pub use config::{Config, OrganizeRule, PatternKind};
pub use error::{ConfigError, Error, PatternError, Result};
pub use log::{Failure, Outcome, ResultLog, ResultRecord, Summary};
pub use organizer::{ConflictResolver, OrganizeOptions, Organizer};
pub use rules::{CompiledRule, Matcher, RuleSet};

/// Current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Expand ~ and environment variables ($VAR, ${VAR}) in a path
pub fn expand_path(path: &std::path::Path) -> std::path::PathBuf {
    let path_str = path.to_string_lossy();

    // First expand ~ prefix
    let expanded = if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            home.join(stripped).to_string_lossy().to_string()
        } else {
            path_str.to_string()
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            home.to_string_lossy().to_string()
        } else {
            path_str.to_string()
        }
    } else {
        path_str.to_string()
    };

    use std::sync::LazyLock;
    static ENV_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("invalid env regex")
    });

    // Unknown variables are left as written
    let result = ENV_RE.replace_all(&expanded, |caps: &regex::Captures| {
        let var_name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    });

    std::path::PathBuf::from(result.as_ref())
}
