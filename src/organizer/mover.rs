//! Relocating one file onto a reserved destination

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// How the file got there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Rename,
    CopyThenRemove,
}

#[derive(Debug)]
pub enum MoveError {
    /// The source disappeared before it could be moved
    SourceGone,
    /// Nothing changed on disk
    Move(io::Error),
    /// The destination holds a full copy but the source is still there
    OriginalNotRemoved(io::Error),
}

/// Move `src` onto `dest`, which must be a placeholder claimed by the resolver.
///
/// Renames when possible; across devices copies, checks the length and removes
/// the source. On any failure before the copy completes the placeholder is
/// removed, so no partial destination file is left behind.
pub fn relocate(src: &Path, dest: &Path) -> Result<Method, MoveError> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(Method::Rename),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Rename across devices, copying {} -> {}",
                src.display(),
                dest.display()
            );
            copy_then_remove(src, dest, |p| fs::remove_file(p))
        }
        Err(e) => {
            discard(dest);
            if src.symlink_metadata().is_err() {
                Err(MoveError::SourceGone)
            } else {
                Err(MoveError::Move(e))
            }
        }
    }
}

/// `remove` deletes the source once the copy is verified
fn copy_then_remove(
    src: &Path,
    dest: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<Method, MoveError> {
    let expected = match fs::metadata(src) {
        Ok(meta) => meta.len(),
        Err(e) => {
            discard(dest);
            return Err(if e.kind() == io::ErrorKind::NotFound {
                MoveError::SourceGone
            } else {
                MoveError::Move(e)
            });
        }
    };

    match fs::copy(src, dest) {
        Ok(written) if written == expected => {}
        Ok(written) => {
            discard(dest);
            return Err(MoveError::Move(io::Error::other(format!(
                "copy incomplete: wrote {} of {} bytes",
                written, expected
            ))));
        }
        Err(e) => {
            discard(dest);
            return Err(MoveError::Move(e));
        }
    }

    remove(src).map_err(MoveError::OriginalNotRemoved)?;
    Ok(Method::CopyThenRemove)
}

/// Drop a placeholder or partial copy
fn discard(dest: &Path) {
    if let Err(e) = fs::remove_file(dest)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!("Could not remove {}: {}", dest.display(), e);
    }
}
