//! core::ops::lock
//!
//! Exclusive repository lock for mutating commands.
//!
//! # Architecture
//!
//! The graph store serializes mutations inside one process through its
//! backend transactions. Separate `strata` processes writing the same
//! repository additionally coordinate through this lock, taken at
//! `<repo>/.strata/lock`.
//!
//! # Invariants
//!
//! - Lock must be held for the whole mutating command
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```no_run
//! use strata::core::ops::lock::RepoLock;
//! use strata::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/data/roads"));
//! let lock = RepoLock::acquire(&paths)?;
//! // ... mutate the graph ...
//! drop(lock);
//! # Ok::<(), strata::core::ops::lock::LockError>(())
//! ```

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

use crate::core::paths::RepoPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is locked by another strata process")]
    AlreadyLocked,

    /// The repository marker directory does not exist.
    #[error("not a strata repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to create the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the repository.
///
/// Released when dropped, even if the holding command fails.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: Option<File>,
}

impl RepoLock {
    /// Attempt to acquire the repository lock.
    ///
    /// Uses OS-level file locking via `fs2`, which works across processes.
    ///
    /// # Errors
    ///
    /// - [`LockError::NotARepository`] if `.strata/` is missing
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be opened
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &RepoPaths) -> Result<Self, LockError> {
        if !paths.is_repository() {
            return Err(LockError::NotARepository(paths.root.clone()));
        }

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "repo.lock.acquired");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly. Safe to call more than once.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
            debug!(path = %self.path.display(), "repo.lock.released");
        }
        Ok(())
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
