//! Log Writer
//!
//! Appends commit records to the data file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::warn;

use crate::error::Result;

use super::format;
use super::record::{CommitRecord, Operation};
use super::SyncStrategy;

/// Appends records to the data file
pub struct LogWriter {
    file: File,
    /// Length of the file up to the last complete record
    len: u64,
    next_txid: u64,
    sync_strategy: SyncStrategy,
}

impl LogWriter {
    /// Create a fresh data file containing only the file header
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        format::write_file_header(&mut file)?;
        file.sync_all()?;

        Ok(Self {
            file,
            len: format::FILE_HEADER_SIZE,
            next_txid: 1,
            sync_strategy,
        })
    }

    /// Open an existing, already-recovered data file for appending
    ///
    /// `len` is the recovered length; anything past it is discarded.
    pub fn open(path: &Path, len: u64, next_txid: u64, sync_strategy: SyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        if file.metadata()?.len() != len {
            file.set_len(len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(len))?;

        Ok(Self {
            file,
            len,
            next_txid,
            sync_strategy,
        })
    }

    /// Append one record holding `operations`; returns its txid
    ///
    /// On failure the file is cut back to its previous length so a torn
    /// record never precedes later appends.
    pub fn append(&mut self, operations: Vec<Operation>) -> Result<u64> {
        let txid = self.next_txid;
        let bytes = CommitRecord::new(txid, operations).serialize()?;

        if let Err(e) = self.write_record(&bytes) {
            if let Err(cut) = self.file.set_len(self.len) {
                warn!(target: "clipstash::store", error = %cut, "failed to cut back torn record");
            }
            let _ = self.file.seek(SeekFrom::Start(self.len));
            return Err(e);
        }

        self.len += bytes.len() as u64;
        self.next_txid += 1;
        Ok(txid)
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        match self.sync_strategy {
            SyncStrategy::EveryCommit => self.file.sync_data()?,
            SyncStrategy::Never => self.file.flush()?,
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Bytes in the file, header included
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when no record has been written yet
    pub fn is_empty(&self) -> bool {
        self.len == format::FILE_HEADER_SIZE
    }

    /// Txid the next append will use
    pub fn next_txid(&self) -> u64 {
        self.next_txid
    }
}
