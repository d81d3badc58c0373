//! Per-pass result log

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a file or rule could not be handled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Failure {
    /// The rule's source folder could not be listed
    DirectoryAccess(String),
    /// The destination folder could not be created
    Destination(String),
    /// Rename or copy failed; the source is untouched
    Move(String),
    /// Copied to the destination but the original could not be removed
    OriginalNotRemoved(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::DirectoryAccess(e) => write!(f, "cannot read source folder: {}", e),
            Failure::Destination(e) => write!(f, "cannot create destination folder: {}", e),
            Failure::Move(e) => write!(f, "move failed: {}", e),
            Failure::OriginalNotRemoved(e) => {
                write!(f, "copied but original not removed: {}", e)
            }
        }
    }
}

/// What happened to one file (or rule)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Moved under its own name
    Moved,
    /// Moved under a disambiguated name because the name was taken
    Renamed,
    /// Dry run: would be moved (and renamed, if `renamed`)
    Planned { renamed: bool },
    /// Left alone on purpose
    Skipped { reason: String },
    Failed { failure: Failure },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One logged decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    /// Name of the rule that produced the record
    pub rule: String,
    /// Position of that rule in the config
    pub rule_index: usize,
    /// The file, or the rule's source folder for rule-level failures
    pub source: PathBuf,
    /// Final path when the file ended up (or would end up) in the destination
    pub destination: Option<PathBuf>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let src = self.source.display();
        let dest = self
            .destination
            .as_deref()
            .map(Path::display)
            .map(|d| d.to_string())
            .unwrap_or_default();

        match &self.outcome {
            Outcome::Moved => write!(f, "[{}] moved: {} -> {}", self.rule, src, dest),
            Outcome::Renamed => write!(
                f,
                "[{}] renamed due to conflict: {} -> {}",
                self.rule, src, dest
            ),
            Outcome::Planned { renamed: false } => {
                write!(f, "[{}] would move: {} -> {}", self.rule, src, dest)
            }
            Outcome::Planned { renamed: true } => write!(
                f,
                "[{}] would move (renamed due to conflict): {} -> {}",
                self.rule, src, dest
            ),
            Outcome::Skipped { reason } => {
                write!(f, "[{}] skipped {}: {}", self.rule, src, reason)
            }
            Outcome::Failed { failure } => match &self.destination {
                Some(_) => write!(f, "[{}] failed {} -> {}: {}", self.rule, src, dest, failure),
                None => write!(f, "[{}] failed {}: {}", self.rule, src, failure),
            },
        }
    }
}

/// Outcome counts for a pass or a rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub moved: usize,
    pub renamed: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Moved => self.moved += 1,
            Outcome::Renamed => self.renamed += 1,
            Outcome::Planned { .. } => self.planned += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Files that now live in a destination folder
    pub fn relocated(&self) -> usize {
        self.moved + self.renamed
    }
}

/// Ordered, append-only record of one pass
#[derive(Debug, Clone, Serialize)]
pub struct ResultLog {
    pub started_at: DateTime<Local>,
    pub dry_run: bool,
    /// The pass stopped early on request
    pub cancelled: bool,
    records: Vec<ResultRecord>,
}

impl ResultLog {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Local::now(),
            dry_run,
            cancelled: false,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.records.iter().any(|r| r.outcome.is_failure())
    }

    /// One line per record, in processing order
    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for record in &self.records {
            summary.add(&record.outcome);
        }
        summary
    }

    /// Per-rule counts, in the order rules first appear in the log
    pub fn rule_summaries(&self) -> Vec<(usize, String, Summary)> {
        let mut out: Vec<(usize, String, Summary)> = Vec::new();
        for record in &self.records {
            match out.iter_mut().find(|(idx, _, _)| *idx == record.rule_index) {
                Some((_, _, summary)) => summary.add(&record.outcome),
                None => {
                    let mut summary = Summary::default();
                    summary.add(&record.outcome);
                    out.push((record.rule_index, record.rule.clone(), summary));
                }
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
