//! Locked, atomic file replacement.
//!
//! # Design
//!
//! A [`LockedFile`] writes into a staging file next to the target and
//! only replaces the target on [`commit`](LockedFile::commit):
//!
//! 1. Open `<file>.lock` and take an exclusive `fs2` lock on it
//! 2. Create `<file>.tmp` and write the new content
//! 3. Flush, fsync, rename `<file>.tmp` over `<file>` (atomic on Unix)
//! 4. Release the lock
//!
//! The lock file is never renamed or removed, so every writer locks the
//! same inode no matter how often the target has been replaced. The
//! staging file is only created or truncated while the lock is held.
//!
//! Dropping a `LockedFile` without committing removes the staging file
//! and leaves the target untouched. Readers of the target always see
//! either the old or the complete new content.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// Exclusive, uncommitted replacement of a file.
pub struct LockedFile {
    target: PathBuf,
    staging: PathBuf,
    writer: Option<BufWriter<File>>,
    // Declared last: the lock is released after the staging file is closed
    _lock: File,
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

/// Path of the lock file guarding `target`.
pub fn lock_path(target: &Path) -> PathBuf {
    sibling(target, ".lock")
}

/// Path of the staging file used while replacing `target`.
pub fn staging_path(target: &Path) -> PathBuf {
    sibling(target, ".tmp")
}

fn discard(staging: &Path) {
    if let Err(e) = fs::remove_file(staging) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Failed to remove {}: {}", staging.display(), e);
        }
    }
}

impl LockedFile {
    /// Lock `target` for writing and start an empty staging file.
    ///
    /// Fails with `WouldBlock` if another writer currently holds the lock.
    pub fn open(target: &Path) -> io::Result<Self> {
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path(target))?;
        lock.try_lock_exclusive()?;

        let staging = staging_path(target);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&staging)?;

        Ok(Self {
            target: target.to_path_buf(),
            staging,
            writer: Some(BufWriter::new(file)),
            _lock: lock,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush the staged content and move it over the target.
    ///
    /// On failure the staging file is removed and the target is unchanged.
    pub fn commit(mut self) -> io::Result<()> {
        let Some(writer) = self.writer.take() else {
            return Err(io::Error::other("already committed"));
        };

        let result = Self::replace(writer, &self.staging, &self.target);
        if result.is_err() {
            discard(&self.staging);
        }
        result
    }

    fn replace(writer: BufWriter<File>, staging: &Path, target: &Path) -> io::Result<()> {
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(staging, target)
    }
}

impl Write for LockedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(w) => w.write(buf),
            None => Err(io::Error::other("already committed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            // Uncommitted: throw the staged content away
            drop(writer);
            discard(&self.staging);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
