//! Entry codec
//!
//! Maps entry IDs to store keys and parses the reference lines printed by
//! `list`.
//!
//! ## Key Format
//! ```text
//! ┌───────────────────────────────┐
//! │  ID as u64, big-endian (8)    │
//! └───────────────────────────────┘
//! ```
//! Big-endian keeps byte order equal to numeric order, so iterating the
//! bucket backwards yields the newest entries first.
//!
//! ## Reference Line Format
//! ```text
//! <decimal id>\t<anything>
//! ```

use crate::error::{Result, StashError};

/// Length of an encoded key
pub const KEY_SIZE: usize = 8;

/// Separator between the ID and the preview in a list line
pub const FIELD_SEPARATOR: u8 = b'\t';

/// Encode an ID as its store key
pub fn encode_id(id: u64) -> [u8; KEY_SIZE] {
    id.to_be_bytes()
}

/// Decode a store key back into an ID
pub fn decode_id(key: &[u8]) -> Result<u64> {
    let bytes: [u8; KEY_SIZE] = key.try_into().map_err(|_| {
        StashError::Corruption(format!(
            "entry key must be {} bytes, got {}",
            KEY_SIZE,
            key.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Format one `list` line (without the trailing newline)
pub fn format_line(id: u64, preview: &str) -> String {
    format!("{}{}{}", id, FIELD_SEPARATOR as char, preview)
}

/// Parse the ID at the start of a reference line
///
/// Only the bytes before the first tab are looked at. A line without a tab,
/// or whose prefix is not a plain decimal number, is rejected.
pub fn parse_reference(line: &[u8]) -> Result<u64> {
    let Some(tab) = line.iter().position(|&b| b == FIELD_SEPARATOR) else {
        return Err(StashError::InvalidReference(format!(
            "missing tab separator in {:?}",
            abbreviate(line)
        )));
    };

    let prefix = &line[..tab];
    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return Err(StashError::InvalidReference(format!(
            "{:?} is not a decimal id",
            abbreviate(prefix)
        )));
    }

    // All ASCII digits, so this is valid UTF-8; only overflow can fail.
    std::str::from_utf8(prefix)
        .ok()
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| {
            StashError::InvalidReference(format!("id {:?} is out of range", abbreviate(prefix)))
        })
}

/// Parse every non-blank line of `input`; fails on the first bad one
pub fn parse_references(input: &[u8]) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for line in input.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        ids.push(parse_reference(line)?);
    }

    if ids.is_empty() {
        return Err(StashError::InvalidReference(
            "no reference lines given".to_string(),
        ));
    }
    Ok(ids)
}

fn abbreviate(bytes: &[u8]) -> String {
    const LIMIT: usize = 32;
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(LIMIT)]).into_owned();
    if bytes.len() > LIMIT {
        text + "…"
    } else {
        text
    }
}
