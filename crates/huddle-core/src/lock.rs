//! Per-match advisory locks.
//!
//! Batch analysis deletes and rewrites a match's whole metric set, so two
//! analyses of the same match must not interleave. Callers take a
//! [`MatchLock`] for the match before importing or analysing it; different
//! matches lock different files and proceed independently.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Advisory lock errors.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", .path.display())]
    Timeout { path: PathBuf, waited: Duration },
    #[error("lock file I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::StoreWriteFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// RAII guard holding an exclusive lock on one match.
#[derive(Debug)]
pub struct MatchLock {
    file: File,
    path: PathBuf,
}

impl MatchLock {
    /// Lock file used for `match_id` inside `lock_dir`.
    #[must_use]
    pub fn path_for(lock_dir: &Path, match_id: i64) -> PathBuf {
        lock_dir.join(format!("match-{match_id}.lock"))
    }

    /// Acquire the exclusive lock for `match_id`, polling until `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another holder keeps the lock past
    /// `timeout`, or [`LockError::Io`] if the lock file cannot be opened.
    pub fn acquire(lock_dir: &Path, match_id: i64, timeout: Duration) -> Result<Self, LockError> {
        fs::create_dir_all(lock_dir)?;
        let path = Self::path_for(lock_dir, match_id);

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            if file.try_lock_exclusive().is_ok() {
                tracing::debug!(match_id, path = %path.display(), "match lock acquired");
                return Ok(Self { file, path });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path,
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        drop(self);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MatchLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
