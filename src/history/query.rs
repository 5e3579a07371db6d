//! Query operations
//!
//! Read paths (list, decode) use a read-only transaction; every delete
//! variant runs in exactly one write transaction of its own.

use std::io::Write;

use memchr::memmem;
use tracing::debug;

use crate::codec::{self, decode_id, encode_id};
use crate::error::{Result, StashError};
use crate::preview::Preview;
use crate::store::{Order, Visit};

use super::{Entry, History, BUCKET};

impl History {
    /// Write one `"<id>\t<preview>"` line per entry, newest first
    ///
    /// Returns the number of lines written.
    pub fn list<W: Write + ?Sized>(&self, out: &mut W, preview: &Preview) -> Result<usize> {
        self.db.view(|tx| {
            let Some(bucket) = tx.bucket(BUCKET) else {
                return Ok(0);
            };

            let mut written = 0;
            for (key, payload) in bucket.iter().rev() {
                let id = decode_id(key)?;
                writeln!(out, "{}", codec::format_line(id, &preview.render(payload)))?;
                written += 1;
            }
            Ok(written)
        })
    }

    /// Every entry, newest first
    pub fn entries(&self) -> Result<Vec<Entry>> {
        self.db.view(|tx| {
            let Some(bucket) = tx.bucket(BUCKET) else {
                return Ok(Vec::new());
            };

            bucket
                .iter()
                .rev()
                .map(|(key, payload)| -> Result<Entry> {
                    Ok(Entry {
                        id: decode_id(key)?,
                        payload: payload.to_vec(),
                    })
                })
                .collect()
        })
    }

    /// Exact payload stored under `id`
    pub fn get(&self, id: u64) -> Result<Option<Vec<u8>>> {
        self.db.view(|tx| {
            Ok(tx
                .bucket(BUCKET)
                .and_then(|bucket| bucket.get(&encode_id(id)))
                .map(<[u8]>::to_vec))
        })
    }

    /// Payload referenced by the first line of `reference`
    ///
    /// A well-formed reference to an entry that no longer exists yields
    /// `None`; malformed input is an error.
    pub fn decode(&self, reference: &[u8]) -> Result<Option<Vec<u8>>> {
        let line = reference
            .split(|&b| b == b'\n')
            .next()
            .unwrap_or(reference);
        let id = codec::parse_reference(line)?;
        let payload = self.get(id)?;
        if payload.is_none() {
            debug!(target: "clipstash::history", id, "decode of missing entry");
        }
        Ok(payload)
    }

    /// Delete entries by ID in one transaction; missing IDs are ignored
    pub fn delete(&self, ids: &[u64]) -> Result<usize> {
        let deleted = self.db.update(|tx| {
            let mut entries = tx.bucket_mut(BUCKET)?;
            let mut deleted = 0;
            for &id in ids {
                if entries.delete(&encode_id(id))? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })?;

        debug!(target: "clipstash::history", requested = ids.len(), deleted, "deleted by id");
        Ok(deleted)
    }

    /// Delete every entry referenced by the lines of `input`
    ///
    /// All lines are parsed first; one bad line aborts before any deletion.
    pub fn delete_references(&self, input: &[u8]) -> Result<usize> {
        let ids = codec::parse_references(input)?;
        self.delete(&ids)
    }

    /// Delete every entry whose payload contains `query`
    pub fn delete_query(&self, query: &[u8]) -> Result<usize> {
        if query.is_empty() {
            return Err(StashError::EmptyQuery);
        }

        let finder = memmem::Finder::new(query);
        let deleted = self.db.update(|tx| {
            tx.bucket_mut(BUCKET)?.sweep(Order::OldestFirst, |_, payload| {
                if finder.find(payload).is_some() {
                    Visit::Delete
                } else {
                    Visit::Keep
                }
            })
        })?;

        debug!(target: "clipstash::history", deleted, "deleted by query");
        Ok(deleted)
    }

    /// Delete every entry; the sequence keeps counting from where it was
    pub fn wipe(&self) -> Result<usize> {
        let deleted = self.db.update(|tx| {
            tx.bucket_mut(BUCKET)?
                .sweep(Order::OldestFirst, |_, _| Visit::Delete)
        })?;

        debug!(target: "clipstash::history", deleted, "wiped");
        Ok(deleted)
    }

    /// Delete the newest entry, returning its ID
    pub fn delete_last(&self) -> Result<Option<u64>> {
        self.db.update(|tx| {
            let newest = tx
                .bucket(BUCKET)
                .and_then(|bucket| bucket.last())
                .map(|(key, _)| key.to_vec());
            let Some(key) = newest else {
                return Ok(None);
            };

            let id = decode_id(&key)?;
            tx.bucket_mut(BUCKET)?.delete(&key)?;
            debug!(target: "clipstash::history", id, "deleted newest entry");
            Ok(Some(id))
        })
    }
}
