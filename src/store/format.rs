//! Data file header

use std::io::{Read, Write};

use crate::error::{Result, StashError};

/// Magic bytes at the start of every data file
pub const MAGIC: &[u8; 4] = b"CSDB";

/// Current on-disk format version
pub const FORMAT_VERSION: u16 = 1;

/// Magic (4) + version (2)
pub const FILE_HEADER_SIZE: u64 = 6;

pub fn write_file_header<W: Write>(writer: &mut W) -> Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    Ok(())
}

pub fn read_file_header<R: Read>(reader: &mut R) -> Result<()> {
    let mut header = [0u8; FILE_HEADER_SIZE as usize];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            StashError::Corruption("data file is shorter than its header".to_string())
        }
        _ => StashError::Io(e),
    })?;

    if &header[0..4] != MAGIC {
        return Err(StashError::Corruption(format!(
            "invalid data file magic: expected CSDB, got {:?}",
            &header[0..4]
        )));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(StashError::Corruption(format!(
            "unsupported data file version: {}",
            version
        )));
    }

    Ok(())
}
