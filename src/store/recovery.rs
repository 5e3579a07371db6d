//! Log Recovery
//!
//! Replays the data file on open and finds where the valid log ends.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, StashError};

use super::reader::LogReader;
use super::record::CommitRecord;

/// Handles replay of the data file
pub struct LogRecovery;

/// Result of a recovery pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully replayed
    pub records_recovered: u64,

    /// Last valid txid (0 if the log is empty)
    pub last_txid: u64,

    /// Length of the file up to the end of the last valid record
    pub valid_len: u64,

    /// Bytes past `valid_len` that belong to a torn or corrupt tail
    pub bytes_discarded: u64,
}

impl RecoveryResult {
    /// True when a tail has to be cut off
    pub fn has_torn_tail(&self) -> bool {
        self.bytes_discarded > 0
    }
}

impl LogRecovery {
    /// Replay every valid record of `path` into `apply`, oldest first
    ///
    /// Replay stops at the first torn or corrupt record; that record and
    /// everything after it count as discarded. The file itself is not
    /// modified. Errors returned by `apply` abort recovery.
    pub fn recover<F>(path: &Path, mut apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(CommitRecord) -> Result<()>,
    {
        let mut reader = LogReader::open(path)?;
        let mut records_recovered = 0;
        let mut last_txid = 0;
        let mut valid_len = reader.position();

        loop {
            match reader.next_record() {
                Ok(Some(record)) => {
                    if record.txid <= last_txid {
                        warn!(
                            target: "clipstash::store",
                            txid = record.txid,
                            last_txid,
                            "non-increasing txid, treating rest of log as torn"
                        );
                        break;
                    }
                    last_txid = record.txid;
                    valid_len = reader.position();
                    records_recovered += 1;
                    apply(record)?;
                }
                Ok(None) => break,
                Err(StashError::Corruption(reason)) => {
                    warn!(target: "clipstash::store", path = %path.display(), %reason, "discarding torn log tail");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let result = RecoveryResult {
            records_recovered,
            last_txid,
            valid_len,
            bytes_discarded: reader.file_len() - valid_len,
        };

        debug!(
            target: "clipstash::store",
            records = result.records_recovered,
            last_txid = result.last_txid,
            discarded = result.bytes_discarded,
            "recovery complete"
        );
        Ok(result)
    }

    /// Verify integrity of a data file without applying anything
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::recover(path, |_| Ok(()))
    }
}
