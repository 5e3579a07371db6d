//! Log Reader
//!
//! Reads commit records sequentially from the data file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Result, StashError};

use super::format::{self, FILE_HEADER_SIZE};
use super::record::{self, CommitRecord, HEADER_SIZE};

/// Reads records from the data file
pub struct LogReader {
    reader: BufReader<File>,
    /// Offset just past the last record that decoded cleanly
    position: u64,
    file_len: u64,
}

impl LogReader {
    /// Open a data file for reading and validate its file header
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        format::read_file_header(&mut file)?;
        file.seek(SeekFrom::Start(FILE_HEADER_SIZE))?;

        Ok(Self {
            reader: BufReader::new(file),
            position: FILE_HEADER_SIZE,
            file_len,
        })
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of file. A partial header, a partial
    /// body or a checksum mismatch is reported as `Corruption`; `position()`
    /// still points at the end of the last good record.
    pub fn next_record(&mut self) -> Result<Option<CommitRecord>> {
        let remaining = self.file_len - self.position;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            return Err(StashError::Corruption(format!(
                "torn record header at offset {} ({} bytes)",
                self.position, remaining
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;
        let (txid, crc, len) = record::parse_header(&header)?;

        if remaining - (HEADER_SIZE as u64) < len as u64 {
            return Err(StashError::Corruption(format!(
                "torn record {} at offset {}: body needs {} bytes, {} left",
                txid,
                self.position,
                len,
                remaining - HEADER_SIZE as u64
            )));
        }

        let mut body = vec![0u8; len];
        self.reader.read_exact(&mut body)?;
        let record = CommitRecord::from_parts(txid, crc, &body)?;

        self.position += (HEADER_SIZE + len) as u64;
        Ok(Some(record))
    }

    /// Offset just past the last cleanly decoded record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the file when it was opened
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Iterate over the remaining records
    pub fn records(self) -> LogIterator {
        LogIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over log records; stops after the first error
pub struct LogIterator {
    reader: LogReader,
    done: bool,
}

impl Iterator for LogIterator {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
