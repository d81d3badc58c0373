//! Operations offered to a calling shell
//!
//! The shell owns everything interactive or persistent: it supplies a
//! [`FilePicker`] and a [`LastPathStore`] and passes config paths in
//! explicitly on every call.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::log::ResultLog;
use crate::organizer::{OrganizeOptions, Organizer};
use crate::rules::RuleSet;

/// Lets the user choose a config file
pub trait FilePicker {
    /// `Ok(None)` means the user backed out
    fn pick_config(&self) -> std::io::Result<Option<PathBuf>>;
}

/// Remembers the last config path between runs
pub trait LastPathStore {
    fn load(&self) -> Result<Option<PathBuf>>;
    fn save(&self, path: &Path) -> Result<()>;
}

/// Result of [`select_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen {
        path: PathBuf,
        /// Present when loading was requested
        config: Option<Config>,
    },
    /// The user cancelled; not an error
    Cancelled,
}

/// Read, parse and validate a config. Nothing is returned unless every rule is usable.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    info!(
        "Loaded {} rules from {}",
        config.rules.len(),
        path.display()
    );
    Ok(config)
}

/// Ask the picker for a config path, optionally loading it
pub fn select_file(picker: &dyn FilePicker, load: bool) -> Result<Selection> {
    let Some(path) = picker.pick_config().map_err(Error::Picker)? else {
        info!("Config selection cancelled");
        return Ok(Selection::Cancelled);
    };

    let config = if load {
        Some(load_config(&path)?)
    } else {
        None
    };
    Ok(Selection::Chosen { path, config })
}

/// Load a config and run one pass, returning one line per record
pub fn organize_files(path: &Path) -> Result<Vec<String>> {
    organize_files_with(path, OrganizeOptions::default()).map(|log| log.lines())
}

/// Load a config and run one pass with options, returning the full log
pub fn organize_files_with(path: &Path, options: OrganizeOptions) -> Result<ResultLog> {
    let config = Config::load(path)?;
    let rules = RuleSet::compile(&config)?;
    Ok(Organizer::with_options(rules, options).run())
}

/// The path the shell remembered last time, if any
pub fn load_last_config_path(store: &dyn LastPathStore) -> Result<Option<PathBuf>> {
    store.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::cell::RefCell;

    struct FixedPicker(Option<PathBuf>);

    impl FilePicker for FixedPicker {
        fn pick_config(&self) -> std::io::Result<Option<PathBuf>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenPicker;

    impl FilePicker for BrokenPicker {
        fn pick_config(&self) -> std::io::Result<Option<PathBuf>> {
            Err(std::io::Error::other("no terminal"))
        }
    }

    #[derive(Default)]
    struct MemoryStore(RefCell<Option<PathBuf>>);

    impl LastPathStore for MemoryStore {
        fn load(&self) -> Result<Option<PathBuf>> {
            Ok(self.0.borrow().clone())
        }

        fn save(&self, path: &Path) -> Result<()> {
            *self.0.borrow_mut() = Some(path.to_path_buf());
            Ok(())
        }
    }

    fn write_config(dir: &assert_fs::TempDir, pattern: &str) -> PathBuf {
        let file = dir.child("rules.toml");
        file.write_str(&format!(
            "[[rules]]\nname = 'Logs'\nsource_folder = '{}'\npattern = '{}'\ndestination_folder = '{}'\n",
            dir.path().join("in").display(),
            pattern,
            dir.path().join("out").display(),
        ))
        .unwrap();
        file.path().to_path_buf()
    }

    #[test]
    fn test_select_cancelled_is_not_an_error() {
        let selection = select_file(&FixedPicker(None), true).unwrap();
        assert_eq!(selection, Selection::Cancelled);
    }

    #[test]
    fn test_select_and_load() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = write_config(&dir, "*.log");

        match select_file(&FixedPicker(Some(path.clone())), true).unwrap() {
            Selection::Chosen { path: chosen, config } => {
                assert_eq!(chosen, path);
                assert_eq!(config.unwrap().rules.len(), 1);
            }
            Selection::Cancelled => panic!("expected a selection"),
        }

        match select_file(&FixedPicker(Some(path)), false).unwrap() {
            Selection::Chosen { config, .. } => assert!(config.is_none()),
            Selection::Cancelled => panic!("expected a selection"),
        }
    }

    #[test]
    fn test_picker_failure_is_an_error() {
        let err = select_file(&BrokenPicker, false).unwrap_err();
        assert!(matches!(err, Error::Picker(_)));
    }

    #[test]
    fn test_load_config_rejects_bad_pattern() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = write_config(&dir, "[abc");
        assert!(matches!(load_config(&path), Err(Error::Pattern(_))));
    }

    #[test]
    fn test_organize_files_returns_lines() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = write_config(&dir, "*.log");
        dir.child("in/a.log").touch().unwrap();
        dir.child("in/b.txt").touch().unwrap();

        let lines = organize_files(&path).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[Logs] moved: "));
        assert!(lines[0].ends_with("a.log"));
    }

    #[test]
    fn test_last_path_round_trip() {
        let store = MemoryStore::default();
        assert_eq!(load_last_config_path(&store).unwrap(), None);
        store.save(Path::new("/etc/rules.toml")).unwrap();
        assert_eq!(
            load_last_config_path(&store).unwrap(),
            Some(PathBuf::from("/etc/rules.toml"))
        );
    }
}
