//! Organizer - runs one pass of the rules over the filesystem
//!
//! Rules run one at a time in priority order and files within a rule one at a
//! time in name order. Every listing happens when its rule starts, so a file
//! moved by an earlier rule is simply not seen by a later one. A dry run lays
//! its planned moves over each listing so later rules see the same folders a
//! real pass would.

mod mover;
mod resolver;

pub use resolver::{ConflictResolver, Resolution, candidate_name};

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

use crate::log::{Failure, Outcome, ResultLog, ResultRecord};
use crate::rules::{CompiledRule, RuleSet};
use mover::{Method, MoveError};

/// Knobs for a pass
#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    /// Plan only; the filesystem is not touched
    pub dry_run: bool,
    /// Checked before each file. Once set, no further move starts.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Runs a [`RuleSet`] against the filesystem
#[derive(Debug)]
pub struct Organizer {
    rules: RuleSet,
    options: OrganizeOptions,
}

/// Bookkeeping that only lives for one pass
#[derive(Default)]
struct Pass {
    resolver: ConflictResolver,
    /// Dry run: files a planned move put in place
    arrivals: Vec<Arrival>,
}

struct Arrival {
    folder: PathBuf,
    path: PathBuf,
    file_name: OsString,
}

impl Pass {
    /// Planned files now sitting in `folder`
    fn arrivals_in(&self, folder: &Path) -> Vec<(PathBuf, OsString)> {
        let key = folder_key(folder);
        self.arrivals
            .iter()
            .filter(|a| a.folder == key)
            .map(|a| (a.path.clone(), a.file_name.clone()))
            .collect()
    }

    /// Record a planned move of `from` onto `to` inside `dest_dir`
    fn shift(&mut self, from: &Path, dest_dir: &Path, to: &Path) {
        self.arrivals.retain(|a| a.path != from);
        self.resolver.release(from);
        if let Some(file_name) = to.file_name() {
            self.arrivals.push(Arrival {
                folder: folder_key(dest_dir),
                path: to.to_path_buf(),
                file_name: file_name.to_os_string(),
            });
        }
    }
}

impl Organizer {
    pub fn new(rules: RuleSet) -> Self {
        Self::with_options(rules, OrganizeOptions::default())
    }

    pub fn with_options(rules: RuleSet, options: OrganizeOptions) -> Self {
        Self { rules, options }
    }

    /// Run every rule once and account for every file touched
    pub fn run(&self) -> ResultLog {
        let mut log = ResultLog::new(self.options.dry_run);
        let mut pass = Pass::default();

        info!(
            "Organizing with {} rules{}",
            self.rules.len(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        for rule in self.rules.iter() {
            if !self.run_rule(rule, &mut pass, &mut log) {
                info!("Pass cancelled");
                log.cancelled = true;
                break;
            }
        }

        let summary = log.summary();
        info!(
            "Pass finished: {} moved, {} renamed, {} planned, {} skipped, {} failed",
            summary.moved, summary.renamed, summary.planned, summary.skipped, summary.failed
        );
        log
    }

    fn cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Returns false when the pass was cancelled
    fn run_rule(&self, rule: &CompiledRule, pass: &mut Pass, log: &mut ResultLog) -> bool {
        if self.cancelled() {
            return false;
        }

        debug!(
            "Rule '{}': {} [{}] -> {}",
            rule.name,
            rule.source_folder.display(),
            rule.pattern,
            rule.destination_folder.display()
        );

        let overlay = self.options.dry_run.then_some(&*pass);
        let candidates = match list_candidates(rule, overlay, log) {
            Some(c) => c,
            None => return true,
        };

        let in_place = same_dir(&rule.source_folder, &rule.destination_folder);

        for (path, file_name) in candidates {
            if self.cancelled() {
                return false;
            }

            if in_place {
                log.push(record(
                    rule,
                    &path,
                    Some(path.clone()),
                    Outcome::Skipped {
                        reason: "already in destination".to_string(),
                    },
                ));
                continue;
            }

            if self.options.dry_run {
                plan_file(rule, &path, &file_name, pass, log);
            } else {
                move_file(rule, &path, &file_name, &pass.resolver, log);
            }
        }

        true
    }
}

fn plan_file(
    rule: &CompiledRule,
    path: &Path,
    file_name: &OsStr,
    pass: &mut Pass,
    log: &mut ResultLog,
) {
    match pass.resolver.plan(&rule.destination_folder, file_name) {
        Ok(res) => {
            info!("[dry-run] {} -> {}", path.display(), res.path.display());
            pass.shift(path, &rule.destination_folder, &res.path);
            log.push(record(
                rule,
                path,
                Some(res.path),
                Outcome::Planned {
                    renamed: res.renamed,
                },
            ));
        }
        Err(e) => log.push(failed(rule, path, None, Failure::Move(e.to_string()))),
    }
}

/// Matching regular files of the rule's source folder, sorted by name.
/// A folder that cannot be listed is logged against the rule.
///
/// With a dry-run `overlay`, files planned away are left out and files
/// planned into the folder are listed as if they were there.
fn list_candidates(
    rule: &CompiledRule,
    overlay: Option<&Pass>,
    log: &mut ResultLog,
) -> Option<Vec<(PathBuf, OsString)>> {
    let arrivals = overlay
        .map(|pass| pass.arrivals_in(&rule.source_folder))
        .unwrap_or_default();

    let entries = match fs::read_dir(&rule.source_folder) {
        Ok(entries) => Some(entries),
        // Only a planned move has created this folder so far
        Err(_) if !arrivals.is_empty() => None,
        Err(e) => {
            warn!(
                "Rule '{}': cannot read {}: {}",
                rule.name,
                rule.source_folder.display(),
                e
            );
            log.push(failed(
                rule,
                &rule.source_folder,
                None,
                Failure::DirectoryAccess(e.to_string()),
            ));
            return None;
        }
    };

    let mut candidates = Vec::new();
    for entry in entries.into_iter().flatten() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Rule '{}': bad directory entry: {}", rule.name, e);
                log.push(failed(
                    rule,
                    &rule.source_folder,
                    None,
                    Failure::DirectoryAccess(e.to_string()),
                ));
                continue;
            }
        };

        // Directories and symlinks are never candidates
        match entry.file_type() {
            Ok(t) if t.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!("Cannot stat {}: {}", entry.path().display(), e);
                log.push(failed(
                    rule,
                    &entry.path(),
                    None,
                    Failure::DirectoryAccess(e.to_string()),
                ));
                continue;
            }
        }

        let file_name = entry.file_name();
        if let Some(pass) = overlay
            && (pass.resolver.is_released(&entry.path())
                || arrivals.iter().any(|(_, name)| *name == file_name))
        {
            continue;
        }

        let Some(name) = file_name.to_str() else {
            debug!("Skipping non-UTF-8 name: {}", entry.path().display());
            continue;
        };

        if rule.matches(name) {
            trace!("Rule '{}' matched {}", rule.name, name);
            candidates.push((entry.path(), file_name));
        }
    }

    for (path, file_name) in arrivals {
        if file_name.to_str().is_some_and(|name| rule.matches(name)) {
            trace!("Rule '{}' matched planned {}", rule.name, path.display());
            candidates.push((path, file_name));
        }
    }

    candidates.sort_by(|a, b| a.1.cmp(&b.1));
    Some(candidates)
}

fn move_file(
    rule: &CompiledRule,
    path: &Path,
    file_name: &OsString,
    resolver: &ConflictResolver,
    log: &mut ResultLog,
) {
    let dest_dir = &rule.destination_folder;

    if let Err(e) = fs::create_dir_all(dest_dir) {
        warn!("Failed to create directory {}: {}", dest_dir.display(), e);
        log.push(failed(rule, path, None, Failure::Destination(e.to_string())));
        return;
    }

    let res = match resolver.reserve(dest_dir, file_name) {
        Ok(res) => res,
        Err(e) => {
            warn!("No destination for {}: {}", path.display(), e);
            log.push(failed(rule, path, None, Failure::Move(e.to_string())));
            return;
        }
    };

    match mover::relocate(path, &res.path) {
        Ok(method) => {
            if method == Method::CopyThenRemove {
                debug!("Copied across devices: {}", path.display());
            }
            info!("Moved {} -> {}", path.display(), res.path.display());
            let outcome = if res.renamed {
                Outcome::Renamed
            } else {
                Outcome::Moved
            };
            log.push(record(rule, path, Some(res.path), outcome));
        }
        Err(MoveError::SourceGone) => {
            debug!("Source vanished: {}", path.display());
            log.push(record(
                rule,
                path,
                None,
                Outcome::Skipped {
                    reason: "source no longer exists".to_string(),
                },
            ));
        }
        Err(MoveError::Move(e)) => {
            warn!("Failed to move {}: {}", path.display(), e);
            log.push(failed(rule, path, None, Failure::Move(e.to_string())));
        }
        Err(MoveError::OriginalNotRemoved(e)) => {
            warn!(
                "Copied {} -> {} but could not remove the original: {}",
                path.display(),
                res.path.display(),
                e
            );
            log.push(failed(
                rule,
                path,
                Some(res.path),
                Failure::OriginalNotRemoved(e.to_string()),
            ));
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    folder_key(a) == folder_key(b)
}

/// The canonical folder when it exists, the path as written otherwise
fn folder_key(folder: &Path) -> PathBuf {
    fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf())
}

fn record(
    rule: &CompiledRule,
    source: &Path,
    destination: Option<PathBuf>,
    outcome: Outcome,
) -> ResultRecord {
    ResultRecord {
        rule: rule.name.clone(),
        rule_index: rule.index,
        source: source.to_path_buf(),
        destination,
        outcome,
    }
}

fn failed(
    rule: &CompiledRule,
    source: &Path,
    destination: Option<PathBuf>,
    failure: Failure,
) -> ResultRecord {
    record(rule, source, destination, Outcome::Failed { failure })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, OrganizeRule};
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn organizer(rules: Vec<OrganizeRule>) -> Organizer {
        Organizer::new(RuleSet::compile(&Config { rules }).unwrap())
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("in/folder.log").create_dir_all().unwrap();
        dir.child("in/file.log").touch().unwrap();

        let log = organizer(vec![OrganizeRule::new(
            "Logs",
            dir.path().join("in"),
            "*.log",
            dir.path().join("out"),
        )])
        .run();

        assert_eq!(log.len(), 1);
        dir.child("in/folder.log").assert(predicate::path::is_dir());
        dir.child("out/file.log").assert(predicate::path::is_file());
    }

    #[test]
    fn test_files_processed_in_name_order() {
        let dir = assert_fs::TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            dir.child("in").child(name).touch().unwrap();
        }

        let log = organizer(vec![OrganizeRule::new(
            "Text",
            dir.path().join("in"),
            "*.txt",
            dir.path().join("out"),
        )])
        .run();

        let names: Vec<_> = log
            .iter()
            .map(|r| r.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_same_folder_is_skipped() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("box/a.log").write_str("stay").unwrap();

        let log = organizer(vec![OrganizeRule::new(
            "Loop",
            dir.path().join("box"),
            "*.log",
            dir.path().join("box"),
        )])
        .run();

        assert_eq!(log.len(), 1);
        assert!(matches!(log.records()[0].outcome, Outcome::Skipped { .. }));
        dir.child("box/a.log").assert("stay");
        dir.child("box/a (1).log").assert(predicate::path::missing());
    }

    #[test]
    fn test_cancel_before_first_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("in/a.log").touch().unwrap();

        let flag = Arc::new(AtomicBool::new(true));
        let rules = RuleSet::compile(&Config {
            rules: vec![OrganizeRule::new(
                "Logs",
                dir.path().join("in"),
                "*.log",
                dir.path().join("out"),
            )],
        })
        .unwrap();
        let log = Organizer::with_options(
            rules,
            OrganizeOptions {
                dry_run: false,
                cancel: Some(flag),
            },
        )
        .run();

        assert!(log.cancelled);
        assert!(log.is_empty());
        dir.child("in/a.log").assert(predicate::path::exists());
    }

    #[test]
    fn test_cancel_stops_before_listing() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("in/a.log").touch().unwrap();

        let rules = RuleSet::compile(&Config {
            rules: vec![
                OrganizeRule::new(
                    "Logs",
                    dir.path().join("in"),
                    "*.log",
                    dir.path().join("out"),
                ),
                OrganizeRule::new(
                    "Ghost",
                    dir.path().join("missing"),
                    "*",
                    dir.path().join("out"),
                ),
            ],
        })
        .unwrap();
        let log = Organizer::with_options(
            rules,
            OrganizeOptions {
                dry_run: false,
                cancel: Some(Arc::new(AtomicBool::new(true))),
            },
        )
        .run();

        // The missing folder is never read, so no failure is recorded
        assert!(log.cancelled);
        assert!(log.is_empty());
        assert!(!log.has_failures());
    }

    #[test]
    fn test_move_failure_does_not_stop_the_rule() {
        let dir = assert_fs::TempDir::new().unwrap();
        // 255 bytes: fits as is, but " (1)" pushes it past the name limit
        let long = format!("{}.log", "a".repeat(251));
        dir.child("in").child(&long).write_str("new").unwrap();
        dir.child("out").child(&long).write_str("old").unwrap();
        dir.child("in/b.log").write_str("b").unwrap();

        let log = organizer(vec![OrganizeRule::new(
            "Logs",
            dir.path().join("in"),
            "*.log",
            dir.path().join("out"),
        )])
        .run();

        assert_eq!(log.len(), 2);
        let first = &log.records()[0];
        assert_eq!(first.source, dir.path().join("in").join(&long));
        assert!(matches!(
            first.outcome,
            Outcome::Failed {
                failure: Failure::Move(_)
            }
        ));
        assert_eq!(first.destination, None);
        dir.child("in").child(&long).assert("new");
        dir.child("out").child(&long).assert("old");

        assert_eq!(log.records()[1].outcome, Outcome::Moved);
        dir.child("out/b.log").assert("b");
        dir.child("in/b.log").assert(predicate::path::missing());
    }

    #[test]
    fn test_dry_run_lists_planned_arrivals() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("in/b.log").touch().unwrap();
        dir.child("stage/a.log").touch().unwrap();

        let rules = RuleSet::compile(&Config {
            rules: vec![
                OrganizeRule::new(
                    "One",
                    dir.path().join("in"),
                    "*.log",
                    dir.path().join("stage"),
                ),
                OrganizeRule::new(
                    "Two",
                    dir.path().join("stage"),
                    "*.log",
                    dir.path().join("final"),
                ),
            ],
        })
        .unwrap();
        let log = Organizer::with_options(
            rules,
            OrganizeOptions {
                dry_run: true,
                cancel: None,
            },
        )
        .run();

        let moves: Vec<_> = log
            .iter()
            .map(|r| (r.source.clone(), r.destination.clone().unwrap()))
            .collect();
        assert_eq!(
            moves,
            [
                (dir.path().join("in/b.log"), dir.path().join("stage/b.log")),
                (dir.path().join("stage/a.log"), dir.path().join("final/a.log")),
                (dir.path().join("stage/b.log"), dir.path().join("final/b.log")),
            ]
        );
        dir.child("final").assert(predicate::path::missing());
    }

    #[test]
    fn test_unwritable_destination_fails_per_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("in/a.log").touch().unwrap();
        // A file where the destination folder should be
        dir.child("out").write_str("not a folder").unwrap();

        let log = organizer(vec![OrganizeRule::new(
            "Logs",
            dir.path().join("in"),
            "*.log",
            dir.path().join("out"),
        )])
        .run();

        assert_eq!(log.len(), 1);
        assert!(matches!(
            log.records()[0].outcome,
            Outcome::Failed {
                failure: Failure::Destination(_)
            }
        ));
        dir.child("in/a.log").assert(predicate::path::exists());
    }
}
