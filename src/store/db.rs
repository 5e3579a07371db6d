//! Database handle
//!
//! Opens the data file, replays it, and hands out transactions.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, StashError};

use super::bucket::Bucket;
use super::format;
use super::lock::{FileLock, LockMode};
use super::record::{CommitRecord, Operation};
use super::recovery::LogRecovery;
use super::tx::Tx;
use super::writer::LogWriter;
use super::{sibling_path, Options};

/// Everything guarded by the in-process lock
pub(crate) struct State {
    pub(crate) buckets: BTreeMap<String, Bucket>,
    /// `None` for read-only handles
    pub(crate) writer: Option<LogWriter>,
}

/// A single-file transactional ordered key-value store
///
/// ## Concurrency Model
///
/// - **Across processes**: an advisory lock on `<file>.lock`, exclusive for
///   read-write handles and shared for read-only ones, held until the handle
///   is dropped.
/// - **Inside a process**: write transactions hold the write side of a
///   `parking_lot::RwLock` for their whole lifetime; read transactions hold
///   the read side.
pub struct Db {
    path: PathBuf,
    options: Options,
    state: RwLock<State>,
    lock: FileLock,
}

impl Db {
    /// Open or create the store at `path`
    ///
    /// Read-only opens of a missing file fail with `NotInitialized`.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if options.read_only {
            Self::open_read_only(path, options)
        } else {
            Self::open_read_write(path, options)
        }
    }

    fn open_read_only(path: PathBuf, options: Options) -> Result<Self> {
        if !path.exists() {
            return Err(StashError::NotInitialized(path));
        }

        let lock = FileLock::acquire(&path, LockMode::Shared, options.lock_timeout)?;
        let mut buckets = BTreeMap::new();

        if fs::metadata(&path)?.len() >= format::FILE_HEADER_SIZE {
            LogRecovery::recover(&path, |record| apply_record(&mut buckets, record))?;
        }

        debug!(target: "clipstash::store", path = %path.display(), buckets = buckets.len(), "opened read-only");
        Ok(Self {
            path,
            options,
            state: RwLock::new(State {
                buckets,
                writer: None,
            }),
            lock,
        })
    }

    fn open_read_write(path: PathBuf, options: Options) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock = FileLock::acquire(&path, LockMode::Exclusive, options.lock_timeout)?;
        let mut buckets = BTreeMap::new();

        // A file shorter than the header was cut off while being created
        let fresh = match fs::metadata(&path) {
            Ok(meta) => meta.len() < format::FILE_HEADER_SIZE,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let writer = if fresh {
            info!(target: "clipstash::store", path = %path.display(), "creating data file");
            LogWriter::create(&path, options.sync_strategy)?
        } else {
            let result = LogRecovery::recover(&path, |record| apply_record(&mut buckets, record))?;
            if result.has_torn_tail() {
                warn!(
                    target: "clipstash::store",
                    path = %path.display(),
                    bytes = result.bytes_discarded,
                    "truncating torn tail"
                );
            }
            LogWriter::open(
                &path,
                result.valid_len,
                result.last_txid + 1,
                options.sync_strategy,
            )?
        };

        debug!(target: "clipstash::store", path = %path.display(), buckets = buckets.len(), "opened read-write");
        Ok(Self {
            path,
            options,
            state: RwLock::new(State {
                buckets,
                writer: Some(writer),
            }),
            lock,
        })
    }

    /// Start a transaction
    ///
    /// Only one writable transaction can exist at a time; a second call
    /// blocks until the first finishes.
    pub fn begin(&self, writable: bool) -> Result<Tx<'_>> {
        if writable {
            if self.options.read_only {
                return Err(StashError::ReadOnly);
            }
            Ok(Tx::write(self, self.state.write()))
        } else {
            Ok(Tx::read(self, self.state.read()))
        }
    }

    /// Run `f` inside a read-only transaction
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let tx = self.begin(false)?;
        f(&tx)
    }

    /// Run `f` inside a write transaction; commit on `Ok`, roll back on `Err`
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<T>,
    {
        let mut tx = self.begin(true)?;
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Rewrite the data file as a single snapshot record
    pub fn compact(&self) -> Result<()> {
        if self.options.read_only {
            return Err(StashError::ReadOnly);
        }
        let mut state = self.state.write();
        self.compact_locked(&mut state)
    }

    pub(crate) fn should_compact(&self, state: &State) -> bool {
        let Some(writer) = state.writer.as_ref() else {
            return false;
        };
        let live: u64 = state.buckets.values().map(|b| b.size() as u64).sum();
        writer.len() > self.options.compaction_threshold && writer.len() > live.saturating_mul(2)
    }

    pub(crate) fn compact_locked(&self, state: &mut State) -> Result<()> {
        let (txid, before) = match state.writer.as_ref() {
            Some(writer) => (writer.next_txid(), writer.len()),
            None => return Err(StashError::ReadOnly),
        };

        let mut operations = Vec::new();
        for (name, bucket) in &state.buckets {
            operations.push(Operation::CreateBucket {
                bucket: name.clone(),
            });
            if bucket.sequence() > 0 {
                operations.push(Operation::SetSequence {
                    bucket: name.clone(),
                    sequence: bucket.sequence(),
                });
            }
            for (key, value) in bucket.iter() {
                operations.push(Operation::Put {
                    bucket: name.clone(),
                    key: key.to_vec(),
                    value: value.to_vec(),
                });
            }
        }

        let tmp_path = sibling_path(&self.path, ".compact");
        if let Err(e) = write_snapshot(&tmp_path, txid, operations) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        // The old writer points at the replaced inode from here on.
        state.writer = None;
        sync_parent_dir(&self.path);

        let len = fs::metadata(&self.path)?.len();
        state.writer = Some(LogWriter::open(
            &self.path,
            len,
            txid + 1,
            self.options.sync_strategy,
        )?);

        info!(target: "clipstash::store", before, after = len, "compacted data file");
        Ok(())
    }

    /// Sync pending writes and release the lock
    pub fn close(self) -> Result<()> {
        if let Some(writer) = self.state.write().writer.as_mut() {
            writer.sync()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_read_only(&self) -> bool {
        self.options.read_only
    }

    /// Path of the sidecar lock file
    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }
}

/// Apply a replayed record to the bucket map
fn apply_record(buckets: &mut BTreeMap<String, Bucket>, record: CommitRecord) -> Result<()> {
    for operation in record.operations {
        match operation {
            Operation::CreateBucket { bucket } => {
                buckets.entry(bucket).or_default();
            }
            Operation::Put { bucket, key, value } => {
                replay_target(buckets, &bucket, record.txid)?.insert(key, value);
            }
            Operation::Delete { bucket, key } => {
                replay_target(buckets, &bucket, record.txid)?.remove(&key);
            }
            Operation::SetSequence { bucket, sequence } => {
                replay_target(buckets, &bucket, record.txid)?.set_sequence(sequence);
            }
        }
    }
    Ok(())
}

fn replay_target<'a>(
    buckets: &'a mut BTreeMap<String, Bucket>,
    name: &str,
    txid: u64,
) -> Result<&'a mut Bucket> {
    buckets.get_mut(name).ok_or_else(|| {
        StashError::Corruption(format!("record {} references unknown bucket {:?}", txid, name))
    })
}

fn write_snapshot(path: &Path, txid: u64, operations: Vec<Operation>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    format::write_file_header(&mut file)?;
    if !operations.is_empty() {
        file.write_all(&CommitRecord::new(txid, operations).serialize()?)?;
    }
    file.sync_all()?;
    Ok(())
}

fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}
