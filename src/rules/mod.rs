//! Validated, compiled rules

mod matcher;

pub use matcher::{CASE_SENSITIVE, Matcher, matches};

use std::path::PathBuf;
use tracing::trace;

use crate::config::{Config, OrganizeRule};
use crate::error::{ConfigError, PatternError};

/// One rule ready to run: folders expanded, pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Position in the config, counting disabled rules
    pub index: usize,
    pub name: String,
    pub source_folder: PathBuf,
    pub destination_folder: PathBuf,
    pub pattern: String,
    matcher: Matcher,
}

impl CompiledRule {
    /// Check a file name against this rule's pattern
    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher.matches(file_name)
    }
}

/// Immutable, ordered rules for a single pass. Disabled rules are left out.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Validate every rule and compile its pattern.
    ///
    /// Fails on the first bad rule; no partial set is ever returned.
    pub fn compile(config: &Config) -> crate::Result<Self> {
        let mut rules = Vec::with_capacity(config.rules.len());

        for (index, rule) in config.rules.iter().enumerate() {
            check_fields(index, rule)?;

            let matcher =
                Matcher::compile(&rule.pattern, rule.kind).map_err(|message| PatternError {
                    rule: rule.name.clone(),
                    pattern: rule.pattern.clone(),
                    message,
                })?;

            if !rule.enabled {
                trace!("Skipping disabled rule: {}", rule.name);
                continue;
            }

            rules.push(CompiledRule {
                index,
                name: rule.name.clone(),
                source_folder: crate::expand_path(&rule.source_folder),
                destination_folder: crate::expand_path(&rule.destination_folder),
                pattern: rule.pattern.clone(),
                matcher,
            });
        }

        Ok(Self { rules })
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Iterate rules in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn check_fields(index: usize, rule: &OrganizeRule) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidRule {
        index: index + 1,
        name: rule.name.clone(),
        message: message.to_string(),
    };

    if rule.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if rule.source_folder.as_os_str().is_empty() {
        return Err(invalid("source_folder must not be empty"));
    }
    if rule.destination_folder.as_os_str().is_empty() {
        return Err(invalid("destination_folder must not be empty"));
    }
    if rule.pattern.is_empty() {
        return Err(invalid("pattern must not be empty"));
    }
    Ok(())
}
