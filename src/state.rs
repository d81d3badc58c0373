//! Remembered config path, kept by the shell in the user's data directory

use fs2::FileExt;
use std::path::{Path, PathBuf};

use crate::commands::LastPathStore;
use crate::error::{Error, Result};

/// Stores the last config path as a single line of text
#[derive(Debug, Clone)]
pub struct FileLastPathStore {
    path: PathBuf,
}

impl FileLastPathStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory, if there is one
    pub fn default_location() -> Option<Self> {
        Self::default_path().map(Self::new)
    }

    /// Get the default state file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("rulesort").join("last_config"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LastPathStore for FileLastPathStore {
    fn load(&self) -> Result<Option<PathBuf>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let line = content.trim();
                Ok((!line.is_empty()).then(|| PathBuf::from(line)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(state_error(&self.path, "read", e)),
        }
    }

    /// Write the path (with advisory file locking).
    ///
    /// Relative paths are stored against the current directory so they still
    /// resolve when the next run starts somewhere else.
    fn save(&self, remembered: &Path) -> Result<()> {
        let remembered = std::path::absolute(remembered)
            .map_err(|e| state_error(remembered, "resolve", e))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| state_error(parent, "create", e))?;
        }

        // Use a lockfile to prevent concurrent writes
        let lock_path = self.path.with_extension("lock");
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| state_error(&lock_path, "open", e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| state_error(&lock_path, "lock", e))?;

        let result = std::fs::write(&self.path, format!("{}\n", remembered.display()))
            .map_err(|e| state_error(&self.path, "write", e));

        let _ = lock_file.unlock();

        result
    }
}

fn state_error(path: &Path, action: &str, e: std::io::Error) -> Error {
    Error::State {
        message: format!("failed to {} {}: {}", action, path.display(), e),
    }
}
