//! History Module
//!
//! The clipboard history on top of the store: one bucket of
//! `big-endian id -> payload` entries.
//!
//! ## Responsibilities
//! - Open the store in read-only or read-write mode
//! - Make sure the history bucket exists before any write
//! - Store with dedup + trim in one transaction (`engine`)
//! - List, decode and delete entries (`query`)

mod engine;
mod query;

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::store::{Db, Options};

/// Name of the bucket holding every entry
pub const BUCKET: &str = "history";

/// One stored clipboard payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: u64,
    pub payload: Vec<u8>,
}

/// Session mode for a history handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// list / decode
    ReadOnly,
    /// store / delete / wipe
    ReadWrite,
}

/// Handle on the clipboard history
pub struct History {
    db: Db,
}

impl History {
    /// Open the history at `path`
    ///
    /// Read-only opens of a store that was never written fail with
    /// `StashError::NotInitialized`.
    pub fn open(path: impl AsRef<Path>, access: Access, lock_timeout: Duration) -> Result<Self> {
        let options = Options::default()
            .read_only(access == Access::ReadOnly)
            .lock_timeout(lock_timeout);
        Self::with_options(path, options)
    }

    /// Open with explicit store options
    pub fn with_options(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let db = Db::open(path, options)?;
        if !db.is_read_only() {
            db.update(|tx| tx.create_bucket_if_not_exists(BUCKET))?;
        }
        Ok(Self { db })
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize> {
        self.db
            .view(|tx| Ok(tx.bucket(BUCKET).map_or(0, |bucket| bucket.len())))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn access(&self) -> Access {
        if self.db.is_read_only() {
            Access::ReadOnly
        } else {
            Access::ReadWrite
        }
    }
}
