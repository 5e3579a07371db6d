//! Commit record definitions
//!
//! Every committed write transaction becomes exactly one record in the log.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

/// Record header: txid (8) + crc (4) + len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest record payload the framing can describe
pub const MAX_RECORD_SIZE: usize = u32::MAX as usize;

/// One committed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Transaction id - monotonically increasing within a file
    pub txid: u64,

    /// Mutations in the order they were applied
    pub operations: Vec<Operation>,

    /// Timestamp (unix millis) when the transaction committed
    pub timestamp: u64,
}

/// Mutations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create an empty bucket
    CreateBucket { bucket: String },

    /// Put a key-value pair
    Put {
        bucket: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key
    Delete { bucket: String, key: Vec<u8> },

    /// Move a bucket's sequence counter
    SetSequence { bucket: String, sequence: u64 },
}

/// Serialized body (everything after the header)
#[derive(Deserialize)]
struct RecordBody {
    operations: Vec<Operation>,
    timestamp: u64,
}

/// Borrowed twin of `RecordBody`; identical encoding
#[derive(Serialize)]
struct RecordBodyRef<'a> {
    operations: &'a [Operation],
    timestamp: u64,
}

impl CommitRecord {
    /// Create a record stamped with the current time
    pub fn new(txid: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            txid,
            operations,
            timestamp,
        }
    }

    /// Serialize to `[txid][crc][len][body]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(&RecordBodyRef {
            operations: &self.operations,
            timestamp: self.timestamp,
        })
        .map_err(|e| StashError::Serialization(e.to_string()))?;

        if body.len() > MAX_RECORD_SIZE {
            return Err(StashError::Serialization(format!(
                "record too large: {} bytes",
                body.len()
            )));
        }

        let crc = compute_crc(self.txid, &body);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
        bytes.extend_from_slice(&self.txid.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Deserialize a complete record, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (txid, crc, len) = parse_header(bytes)?;

        let body = bytes.get(HEADER_SIZE..HEADER_SIZE + len).ok_or_else(|| {
            StashError::Corruption(format!(
                "truncated record {}: expected {} body bytes, got {}",
                txid,
                len,
                bytes.len().saturating_sub(HEADER_SIZE)
            ))
        })?;

        Self::from_parts(txid, crc, body)
    }

    /// Rebuild a record from an already-split header and body
    pub(crate) fn from_parts(txid: u64, crc: u32, body: &[u8]) -> Result<Self> {
        let actual = compute_crc(txid, body);
        if actual != crc {
            return Err(StashError::Corruption(format!(
                "checksum mismatch in record {}: stored {:#010x}, computed {:#010x}",
                txid, crc, actual
            )));
        }

        let body: RecordBody = bincode::deserialize(body)
            .map_err(|e| StashError::Corruption(format!("undecodable record {}: {}", txid, e)))?;

        Ok(Self {
            txid,
            operations: body.operations,
            timestamp: body.timestamp,
        })
    }
}

/// Split a header into (txid, crc, body_len)
pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(StashError::Corruption(format!(
            "incomplete record header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut txid = [0u8; 8];
    txid.copy_from_slice(&bytes[0..8]);
    let mut crc = [0u8; 4];
    crc.copy_from_slice(&bytes[8..12]);
    let mut len = [0u8; 4];
    len.copy_from_slice(&bytes[12..16]);

    Ok((
        u64::from_le_bytes(txid),
        u32::from_le_bytes(crc),
        u32::from_le_bytes(len) as usize,
    ))
}

fn compute_crc(txid: u64, body: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&txid.to_le_bytes());
    hasher.update(body);
    hasher.finalize()
}
