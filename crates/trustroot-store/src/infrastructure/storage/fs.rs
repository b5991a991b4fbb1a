//! Owner-only directory creation and atomic file publication.
//!
//! Documents are written to a uniquely named temporary sibling, fsynced, and
//! only then moved onto the final name, so a reader sees either the previous
//! document or the complete new one.
//!
//! # Why temp file + fsync + rename is atomic (for beginners)
//!
//! Writing a file in place is not a single step.  The OS truncates the file,
//! then copies the new bytes in as the program hands them over.  A reader
//! that opens the file half way through sees a truncated document, and a
//! crash at that moment leaves one behind for good.
//!
//! A *rename* is different.  Within one directory, `rename(temp, final)`
//! swaps the directory entry in one step: any process that opens `final`
//! gets either the old file or the new one, never a mix.  Two details make
//! the trick safe:
//!
//! - The temporary lives in the **same directory** as the target.  A rename
//!   across file systems is a copy in disguise and loses atomicity.
//! - The temporary is **fsynced** before the rename.  Without that, the OS
//!   may persist the rename before the data, and a power cut leaves an
//!   empty file under the final name.
//!
//! # Create-if-absent
//!
//! A rename always replaces its target, which is wrong when two processes
//! race to create the first settings file.  For that case the fsynced
//! temporary is *hard-linked* onto the final name instead.  Linking fails with
//! `AlreadyExists` when the target is present, so exactly one writer wins and
//! the document still appears complete.
//!
//! Some file systems (FAT, some network mounts) have no hard links.  There a
//! sibling lock file created with `create_new` elects a single publisher,
//! which checks that the target is still absent and then renames.  A lock
//! older than [`STALE_LOCK_AGE`] is assumed to belong to a crashed process
//! and is taken over.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use super::StoreError;

/// Mode applied to the state directory and the settings file on Unix.
pub(crate) const OWNER_ONLY_MODE: u32 = 0o700;

/// Age after which a leftover publish lock is treated as abandoned.
pub(crate) const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// How a new document is put in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Publish {
    /// Overwrite whatever is at the destination.
    Replace,
    /// Only publish if the destination does not exist yet.
    CreateNew,
}

/// Result of a successful [`write_private`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Published {
    Written,
    /// [`Publish::CreateNew`] lost: another writer created the file first.
    AlreadyExists,
}

/// Creates `dir` (and missing parents) with owner-only permissions.
///
/// An existing directory is left as it is.
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(OWNER_ONLY_MODE);
    }
    builder.create(dir).map_err(StoreError::io(dir))?;
    debug!(dir = %dir.display(), "created state directory");
    Ok(())
}

/// Writes `bytes` to `path` with owner-only permissions.
pub(crate) fn write_private(
    path: &Path,
    bytes: &[u8],
    publish: Publish,
) -> Result<Published, StoreError> {
    let temp = temp_path(path);
    let result = write_temp(&temp, bytes).and_then(|()| publish_temp(&temp, path, publish));
    // After a rename the temporary is already gone.
    if let Err(e) = fs::remove_file(&temp) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %temp.display(), error = %e, "could not remove temporary file");
        }
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    hidden_sibling(path, &format!("{}.tmp", Uuid::new_v4().simple()))
}

fn lock_path(path: &Path) -> PathBuf {
    hidden_sibling(path, "lock")
}

fn hidden_sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{suffix}"))
}

fn open_private_new(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(OWNER_ONLY_MODE);
    }
    let file = options.open(path)?;
    // The umask may have stripped bits from the requested mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(OWNER_ONLY_MODE))?;
    }
    Ok(file)
}

fn write_temp(temp: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = open_private_new(temp).map_err(StoreError::io(temp))?;
    file.write_all(bytes).map_err(StoreError::io(temp))?;
    file.sync_all().map_err(StoreError::io(temp))?;
    Ok(())
}

fn publish_temp(temp: &Path, path: &Path, publish: Publish) -> Result<Published, StoreError> {
    match publish {
        Publish::Replace => {
            fs::rename(temp, path).map_err(StoreError::io(path))?;
            Ok(Published::Written)
        }
        Publish::CreateNew => match fs::hard_link(temp, path) {
            Ok(()) => Ok(Published::Written),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Published::AlreadyExists),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "hard link unavailable, publishing under lock");
                publish_locked(temp, path)
            }
        },
    }
}

/// Create-if-absent without hard links: rename under an exclusive lock.
fn publish_locked(temp: &Path, path: &Path) -> Result<Published, StoreError> {
    let Some(_lock) = PublishLock::acquire(path)? else {
        return Ok(Published::AlreadyExists);
    };
    match fs::symlink_metadata(path) {
        Ok(_) => return Ok(Published::AlreadyExists),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(StoreError::Io { path: path.to_path_buf(), source: e }),
    }
    fs::rename(temp, path).map_err(StoreError::io(path))?;
    Ok(Published::Written)
}

/// Sibling lock file electing a single publisher.  Removed on drop.
#[derive(Debug)]
struct PublishLock {
    path: PathBuf,
}

impl PublishLock {
    /// Returns `None` while another writer holds a fresh lock.
    fn acquire(target: &Path) -> Result<Option<Self>, StoreError> {
        let path = lock_path(target);
        // Second pass only after removing a stale lock.
        for _ in 0..2 {
            match open_private_new(&path) {
                Ok(_) => return Ok(Some(Self { path })),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !is_stale(&path) {
                        return Ok(None);
                    }
                    warn!(path = %path.display(), "removing abandoned publish lock");
                    if let Err(e) = fs::remove_file(&path) {
                        if e.kind() != io::ErrorKind::NotFound {
                            return Err(StoreError::Io { path, source: e });
                        }
                    }
                }
                Err(e) => return Err(StoreError::Io { path, source: e }),
            }
        }
        Ok(None)
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not release publish lock");
        }
    }
}

fn is_stale(lock: &Path) -> bool {
    fs::metadata(lock)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map_or(false, |age| age >= STALE_LOCK_AGE)
}
