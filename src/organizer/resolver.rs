//! Destination name conflicts
//!
//! A taken name `name.ext` becomes `name (1).ext`, `name (2).ext`, ... until a
//! free one is found. Real passes claim the chosen name on disk with an
//! exclusive create, so the existence check and the claim are one step and two
//! writers can never pick the same number.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Give up after this many taken suffixes
const MAX_SUFFIX: usize = 10_000;

/// Where a file will land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    /// A numeric suffix was needed
    pub renamed: bool,
}

/// Picks free destination names for one pass
#[derive(Debug, Default)]
pub struct ConflictResolver {
    /// Names handed out by [`ConflictResolver::plan`]
    claimed: HashSet<PathBuf>,
    /// Paths a planned move empties; free even though they exist on disk
    released: HashSet<PathBuf>,
}

impl ConflictResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a free name in `dest_dir` by creating an empty placeholder there.
    ///
    /// The caller must replace the placeholder (rename/copy onto it) or remove it.
    pub fn reserve(&self, dest_dir: &Path, file_name: &OsStr) -> io::Result<Resolution> {
        for n in 0..=MAX_SUFFIX {
            let path = dest_dir.join(candidate_name(file_name, n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    if n > 0 {
                        debug!("Name taken, using {}", path.display());
                    }
                    return Ok(Resolution {
                        path,
                        renamed: n > 0,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!("Taken: {}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Err(exhausted(dest_dir, file_name))
    }

    /// Pick a free name without touching the disk, remembering it so a later
    /// plan in the same pass does not pick it again.
    pub fn plan(&mut self, dest_dir: &Path, file_name: &OsStr) -> io::Result<Resolution> {
        for n in 0..=MAX_SUFFIX {
            let path = dest_dir.join(candidate_name(file_name, n));
            if self.is_taken(&path) {
                continue;
            }
            self.released.remove(&path);
            self.claimed.insert(path.clone());
            return Ok(Resolution {
                path,
                renamed: n > 0,
            });
        }
        Err(exhausted(dest_dir, file_name))
    }

    /// A planned move takes the file at `path` away, freeing its name
    pub fn release(&mut self, path: &Path) {
        self.claimed.remove(path);
        self.released.insert(path.to_path_buf());
    }

    pub fn is_released(&self, path: &Path) -> bool {
        self.released.contains(path)
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.claimed.contains(path)
            || (!self.released.contains(path) && path.symlink_metadata().is_ok())
    }
}

/// `n == 0` is the name itself; otherwise ` (n)` goes before the extension
pub fn candidate_name(file_name: &OsStr, n: usize) -> OsString {
    if n == 0 {
        return file_name.to_os_string();
    }

    let as_path = Path::new(file_name);
    let stem = as_path.file_stem().unwrap_or(file_name);
    let mut name = stem.to_os_string();
    name.push(format!(" ({})", n));
    if let Some(ext) = as_path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

fn exhausted(dest_dir: &Path, file_name: &OsStr) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "no free name for {} in {}",
            file_name.to_string_lossy(),
            dest_dir.display()
        ),
    )
}
