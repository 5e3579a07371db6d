//! Transactions
//!
//! A write transaction mutates the in-memory buckets directly and keeps an
//! undo journal. Commit appends one record to the log; rollback (explicit,
//! on drop, or after a failed commit) replays the journal backwards.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::error::{Result, StashError};

use super::bucket::{Bucket, BucketIter};
use super::db::{Db, State};
use super::record::Operation;

enum Guard<'db> {
    Read(RwLockReadGuard<'db, State>),
    Write(RwLockWriteGuard<'db, State>),
}

impl Guard<'_> {
    fn state(&self) -> &State {
        match self {
            Guard::Read(g) => &**g,
            Guard::Write(g) => &**g,
        }
    }
}

/// Inverse of a single applied mutation
#[derive(Debug)]
enum Undo {
    /// Put back `previous` (or remove the key if there was none)
    Restore {
        bucket: String,
        key: Vec<u8>,
        previous: Option<Vec<u8>>,
    },
    Sequence { bucket: String, previous: u64 },
    DropBucket { bucket: String },
}

#[derive(Debug, Default)]
struct Journal {
    operations: Vec<Operation>,
    undo: Vec<Undo>,
}

impl Journal {
    fn record(&mut self, operation: Operation, undo: Undo) {
        self.operations.push(operation);
        self.undo.push(undo);
    }

    fn unwind(&mut self, state: &mut State) {
        self.operations.clear();
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Restore {
                    bucket,
                    key,
                    previous,
                } => {
                    if let Some(b) = state.buckets.get_mut(&bucket) {
                        match previous {
                            Some(value) => {
                                b.insert(key, value);
                            }
                            None => {
                                b.remove(&key);
                            }
                        }
                    }
                }
                Undo::Sequence { bucket, previous } => {
                    if let Some(b) = state.buckets.get_mut(&bucket) {
                        b.set_sequence(previous);
                    }
                }
                Undo::DropBucket { bucket } => {
                    state.buckets.remove(&bucket);
                }
            }
        }
    }
}

/// What a sweep does with the entry it is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Delete,
    /// End the sweep without deciding on this entry
    Stop,
}

/// Sweep direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    OldestFirst,
    NewestFirst,
}

/// A read-only or read-write session on a [`Db`]
pub struct Tx<'db> {
    db: &'db Db,
    guard: Guard<'db>,
    journal: Journal,
    finished: bool,
}

impl<'db> Tx<'db> {
    pub(crate) fn read(db: &'db Db, guard: RwLockReadGuard<'db, State>) -> Self {
        Self {
            db,
            guard: Guard::Read(guard),
            journal: Journal::default(),
            finished: false,
        }
    }

    pub(crate) fn write(db: &'db Db, guard: RwLockWriteGuard<'db, State>) -> Self {
        Self {
            db,
            guard: Guard::Write(guard),
            journal: Journal::default(),
            finished: false,
        }
    }

    pub fn writable(&self) -> bool {
        matches!(self.guard, Guard::Write(_))
    }

    /// Read view of a bucket
    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.guard.state().buckets.get(name)
    }

    /// Create `name` unless it already exists
    pub fn create_bucket_if_not_exists(&mut self, name: &str) -> Result<()> {
        let Tx { guard, journal, .. } = self;
        let Guard::Write(state) = guard else {
            return Err(StashError::ReadOnly);
        };
        if state.buckets.contains_key(name) {
            return Ok(());
        }

        state.buckets.insert(name.to_string(), Bucket::new());
        journal.record(
            Operation::CreateBucket {
                bucket: name.to_string(),
            },
            Undo::DropBucket {
                bucket: name.to_string(),
            },
        );
        Ok(())
    }

    /// Mutable handle on an existing bucket
    pub fn bucket_mut<'a>(&'a mut self, name: &'a str) -> Result<BucketMut<'a>> {
        let max_value_size = self.db.options().max_value_size;
        let Tx { guard, journal, .. } = self;
        let Guard::Write(state) = guard else {
            return Err(StashError::ReadOnly);
        };
        let bucket = state
            .buckets
            .get_mut(name)
            .ok_or_else(|| StashError::BucketNotFound(name.to_string()))?;

        Ok(BucketMut {
            name,
            bucket,
            journal,
            max_value_size,
        })
    }

    /// Number of mutations recorded so far
    pub fn pending_operations(&self) -> usize {
        self.journal.operations.len()
    }

    /// Make every mutation durable as one record
    ///
    /// On failure the transaction is rolled back before the error returns.
    pub fn commit(mut self) -> Result<()> {
        let result = self.commit_inner();
        if result.is_err() {
            self.unwind();
        }
        self.finished = true;
        result
    }

    fn commit_inner(&mut self) -> Result<()> {
        let db = self.db;
        let Guard::Write(state) = &mut self.guard else {
            return Ok(());
        };
        if self.journal.operations.is_empty() {
            return Ok(());
        }

        let writer = state.writer.as_mut().ok_or_else(|| {
            StashError::Io(std::io::Error::other("data file is not open for writing"))
        })?;
        let operations = std::mem::take(&mut self.journal.operations);
        let count = operations.len();
        let txid = writer.append(operations)?;
        self.journal.undo.clear();

        debug!(target: "clipstash::store", txid, operations = count, "committed");

        if db.should_compact(state) {
            if let Err(e) = db.compact_locked(state) {
                warn!(target: "clipstash::store", error = %e, "compaction failed");
            }
        }
        Ok(())
    }

    /// Discard every mutation made in this transaction
    pub fn rollback(mut self) {
        self.unwind();
        self.finished = true;
    }

    fn unwind(&mut self) {
        if let Guard::Write(state) = &mut self.guard {
            if !self.journal.undo.is_empty() {
                debug!(target: "clipstash::store", undone = self.journal.undo.len(), "rolling back");
            }
            self.journal.unwind(state);
        }
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.unwind();
        }
    }
}

/// Mutable handle on one bucket inside a write transaction
pub struct BucketMut<'a> {
    name: &'a str,
    bucket: &'a mut Bucket,
    journal: &'a mut Journal,
    max_value_size: usize,
}

impl BucketMut<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.bucket.get(key)
    }

    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }

    pub fn sequence(&self) -> u64 {
        self.bucket.sequence()
    }

    pub fn iter(&self) -> BucketIter<'_> {
        self.bucket.iter()
    }

    /// Insert or replace a value
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_size {
            return Err(StashError::ValueTooLarge {
                size: value.len(),
                limit: self.max_value_size,
            });
        }

        let previous = self.bucket.insert(key.to_vec(), value.to_vec());
        self.journal.record(
            Operation::Put {
                bucket: self.name.to_string(),
                key: key.to_vec(),
                value: value.to_vec(),
            },
            Undo::Restore {
                bucket: self.name.to_string(),
                key: key.to_vec(),
                previous,
            },
        );
        Ok(())
    }

    /// Delete a key; returns false (and records nothing) if it was absent
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        let Some(previous) = self.bucket.remove(key) else {
            return Ok(false);
        };
        self.journal.record(
            Operation::Delete {
                bucket: self.name.to_string(),
                key: key.to_vec(),
            },
            Undo::Restore {
                bucket: self.name.to_string(),
                key: key.to_vec(),
                previous: Some(previous),
            },
        );
        Ok(true)
    }

    /// Advance and return the bucket's sequence; never repeats a value
    pub fn next_sequence(&mut self) -> Result<u64> {
        let previous = self.bucket.sequence();
        let next = previous
            .checked_add(1)
            .ok_or_else(|| StashError::SequenceOverflow(self.name.to_string()))?;

        self.bucket.set_sequence(next);
        self.journal.record(
            Operation::SetSequence {
                bucket: self.name.to_string(),
                sequence: next,
            },
            Undo::Sequence {
                bucket: self.name.to_string(),
                previous,
            },
        );
        Ok(next)
    }

    /// Visit entries in `order`, deleting those the visitor marks
    ///
    /// The visitor sees each entry once, in order, until it answers
    /// [`Visit::Stop`] or the bucket is exhausted. Deletions are applied
    /// after the walk. Returns the number of entries deleted.
    pub fn sweep<F>(&mut self, order: Order, mut visit: F) -> Result<usize>
    where
        F: FnMut(&[u8], &[u8]) -> Visit,
    {
        let mut doomed = Vec::new();
        {
            let mut decide = |key: &[u8], value: &[u8]| match visit(key, value) {
                Visit::Keep => true,
                Visit::Delete => {
                    doomed.push(key.to_vec());
                    true
                }
                Visit::Stop => false,
            };
            match order {
                Order::OldestFirst => {
                    for (key, value) in self.bucket.iter() {
                        if !decide(key, value) {
                            break;
                        }
                    }
                }
                Order::NewestFirst => {
                    for (key, value) in self.bucket.iter().rev() {
                        if !decide(key, value) {
                            break;
                        }
                    }
                }
            }
        }

        for key in &doomed {
            self.delete(key)?;
        }
        Ok(doomed.len())
    }
}
