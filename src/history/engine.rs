//! Log engine
//!
//! Store path of the history: dedup, insert and trim, all inside one write
//! transaction.
//!
//! ## Steps
//! 1. Skip payloads that are empty once surrounding whitespace is dropped
//! 2. Delete identical payloads among the `max_dedupe_search` newest entries
//! 3. Insert under the next value of the bucket sequence
//! 4. Delete everything older than the `max_items` newest entries
//!
//! Any failure drops the transaction, which rolls back steps 2-4 together
//! (the sequence included).

use tracing::debug;

use crate::codec::encode_id;
use crate::error::Result;
use crate::store::{BucketMut, Order, Visit};

use super::{History, BUCKET};

impl History {
    /// Store `payload` as the newest entry
    ///
    /// Returns the new entry's ID, or `None` for a blank payload. With
    /// `max_items == 0` the new entry is evicted in the same transaction.
    pub fn store(
        &self,
        payload: &[u8],
        max_dedupe_search: usize,
        max_items: usize,
    ) -> Result<Option<u64>> {
        if is_blank(payload) {
            debug!(target: "clipstash::history", len = payload.len(), "ignoring blank payload");
            return Ok(None);
        }

        let mut tx = self.db.begin(true)?;
        let mut entries = tx.bucket_mut(BUCKET)?;

        let deduplicated = deduplicate(&mut entries, payload, max_dedupe_search)?;
        let id = entries.next_sequence()?;
        entries.put(&encode_id(id), payload)?;
        let trimmed = trim(&mut entries, max_items)?;

        tx.commit()?;

        debug!(
            target: "clipstash::history",
            id,
            len = payload.len(),
            deduplicated,
            trimmed,
            "stored entry"
        );
        Ok(Some(id))
    }
}

/// Delete copies of `payload` among the `window` newest entries
fn deduplicate(entries: &mut BucketMut<'_>, payload: &[u8], window: usize) -> Result<usize> {
    let mut seen = 0;
    entries.sweep(Order::NewestFirst, |_, value| {
        if seen == window {
            return Visit::Stop;
        }
        seen += 1;
        if value == payload {
            Visit::Delete
        } else {
            Visit::Keep
        }
    })
}

/// Delete everything older than the `max_items` newest entries
///
/// Counts by walking rather than by ID arithmetic: IDs have gaps once
/// anything was deleted.
fn trim(entries: &mut BucketMut<'_>, max_items: usize) -> Result<usize> {
    let mut seen = 0;
    entries.sweep(Order::NewestFirst, |_, _| {
        seen += 1;
        if seen > max_items {
            Visit::Delete
        } else {
            Visit::Keep
        }
    })
}

/// True when nothing but whitespace is left after trimming both ends
///
/// Whitespace is the Unicode set, matched inside valid UTF-8 runs. A byte
/// that is not valid UTF-8 is never whitespace.
fn is_blank(payload: &[u8]) -> bool {
    payload.utf8_chunks().all(|chunk| {
        chunk.invalid().is_empty() && chunk.valid().chars().all(char::is_whitespace)
    })
}
