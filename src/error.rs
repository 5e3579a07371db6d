//! Error types for clipstash
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StashError
pub type Result<T> = std::result::Result<T, StashError>;

/// Unified error type for clipstash operations
#[derive(Debug, Error)]
pub enum StashError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Access Errors
    // -------------------------------------------------------------------------
    #[error("nothing stored yet: {} does not exist", .0.display())]
    NotInitialized(PathBuf),

    #[error("timed out after {waited_ms}ms waiting for lock on {}", path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("Store corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    #[error("transaction is read-only")]
    ReadOnly,

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("value too large: {size} bytes (max {limit})")]
    ValueTooLarge { size: usize, limit: usize },

    #[error("sequence exhausted for bucket {0}")]
    SequenceOverflow(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("query must not be empty")]
    EmptyQuery,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
