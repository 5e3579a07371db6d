//! Store Module
//!
//! A single-file, transactional, ordered key-value store.
//!
//! ## Responsibilities
//! - Named buckets of ordered key/value pairs, each with a sequence counter
//! - Read-only and read-write transactions with commit/rollback
//! - CRC32-checked commit records, one per transaction
//! - Replay on open, discarding a torn tail
//! - Cross-process locking with a bounded wait
//! - Snapshot compaction once the log outgrows the live data
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Magic "CSDB" (4) │ Version (2)          │
//! ├─────────────────────────────────────────┤
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ TxID (8)│ CRC (4) │Len (4) │ Body   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2 ...                            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The body is the bincode encoding of the transaction's operations and its
//! commit timestamp.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod bucket;
mod db;
mod format;
mod lock;
mod reader;
mod record;
mod recovery;
mod tx;
mod writer;

pub use bucket::{Bucket, BucketIter};
pub use db::Db;
pub use format::{FILE_HEADER_SIZE, FORMAT_VERSION, MAGIC};
pub use lock::{FileLock, LockMode};
pub use reader::{LogIterator, LogReader};
pub use record::{CommitRecord, Operation, HEADER_SIZE};
pub use recovery::{LogRecovery, RecoveryResult};
pub use tx::{BucketMut, Order, Tx, Visit};
pub use writer::LogWriter;

/// When commit records are forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every commit (safest)
    EveryCommit,

    /// leave it to the OS (benchmarks and throwaway stores)
    Never,
}

/// Options for opening a [`Db`]
#[derive(Debug, Clone)]
pub struct Options {
    /// Open with a shared lock and reject write transactions
    pub read_only: bool,

    /// How long to wait for the file lock before giving up
    pub lock_timeout: Duration,

    pub sync_strategy: SyncStrategy,

    /// Largest value a single `put` accepts
    pub max_value_size: usize,

    /// Log size (bytes) below which compaction never runs
    pub compaction_threshold: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            read_only: false,
            lock_timeout: Duration::from_secs(1),
            sync_strategy: SyncStrategy::EveryCommit,
            max_value_size: 64 * 1024 * 1024, // 64 MB
            compaction_threshold: 4 * 1024 * 1024, // 4 MB
        }
    }
}

impl Options {
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.sync_strategy = strategy;
        self
    }

    pub fn max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }

    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = bytes;
        self
    }
}

/// `<dir>/<name><suffix>` next to `path`
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("db"));
    name.push(suffix);
    path.with_file_name(name)
}
