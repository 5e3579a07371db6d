//! Cross-process file lock with a bounded wait.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Result, StashError};

/// Interval between lock attempts while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Any number of readers
    Shared,
    /// One writer, no readers
    Exclusive,
}

/// Holds an advisory lock on `<data file>.lock` until dropped
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl FileLock {
    /// Lock path used for a given data file
    pub fn path_for(data_path: &Path) -> PathBuf {
        super::sibling_path(data_path, ".lock")
    }

    /// Acquire the lock for `data_path`, polling until `timeout` elapses
    pub fn acquire(data_path: &Path, mode: LockMode, timeout: Duration) -> Result<Self> {
        let path = Self::path_for(data_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        let started = Instant::now();
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };

            match attempt {
                Ok(()) => {
                    debug!(target: "clipstash::store", path = %path.display(), ?mode, "lock acquired");
                    return Ok(Self { file, path, mode });
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(StashError::Io(e)),
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(StashError::LockTimeout {
                    path,
                    waited_ms: waited.as_millis() as u64,
                });
            }
            thread::sleep(POLL_INTERVAL.min(timeout - waited));
        }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
