//! Configuration schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Organization rules, in priority order
    #[serde(default, alias = "rule")]
    pub rules: Vec<OrganizeRule>,
}

/// A rule that moves matching files from one folder to another
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizeRule {
    /// Human-readable name
    pub name: String,

    /// Folder whose immediate files are scanned
    pub source_folder: PathBuf,

    /// Pattern tested against each file's base name
    pub pattern: String,

    /// Folder matched files are moved into (created on demand)
    pub destination_folder: PathBuf,

    /// Language of `pattern`
    #[serde(default, rename = "match")]
    pub kind: PatternKind,

    /// Whether the rule is active
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl OrganizeRule {
    /// Create a new glob rule
    pub fn new(
        name: impl Into<String>,
        source_folder: impl Into<PathBuf>,
        pattern: impl Into<String>,
        destination_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            source_folder: source_folder.into(),
            pattern: pattern.into(),
            destination_folder: destination_folder.into(),
            kind: PatternKind::Glob,
            enabled: true,
        }
    }

    /// Switch the rule to a regex pattern
    pub fn regex(mut self) -> Self {
        self.kind = PatternKind::Regex;
        self
    }
}

/// Pattern language of a rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// `*`, `?` and `[...]` classes
    #[default]
    Glob,
    /// Unanchored regular expression
    Regex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_rules() {
        let toml = r#"
            [[rules]]
            name = "Logs"
            source_folder = "/in"
            pattern = "*.log"
            destination_folder = "/out"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rules.len(), 1);
        let rule = &config.rules[0];
        assert_eq!(rule.name, "Logs");
        assert_eq!(rule.source_folder, PathBuf::from("/in"));
        assert_eq!(rule.kind, PatternKind::Glob);
        assert!(rule.enabled);
    }

    #[test]
    fn test_parse_toml_rule_alias_and_options() {
        let toml = r#"
            [[rule]]
            name = "Reports"
            source_folder = "~/Downloads"
            pattern = "^report-\\d+\\.pdf$"
            destination_folder = "~/Documents/Reports"
            match = "regex"
            enabled = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].kind, PatternKind::Regex);
        assert!(!config.rules[0].enabled);
    }

    #[test]
    fn test_parse_yaml_rules_keep_order() {
        let yaml = r#"
rules:
  - name: Images
    source_folder: /in
    pattern: "*.png"
    destination_folder: /out/images
  - name: Docs
    source_folder: /in
    pattern: "*.pdf"
    destination_folder: /out/docs
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = config.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Images", "Docs"]);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let toml = r#"
            [[rules]]
            name = "Broken"
            source_folder = "/in"
            destination_folder = "/out"
        "#;

        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.rules.is_empty());
    }
}
