//! Bucket implementation
//!
//! BTreeMap-backed ordered key space with its own sequence counter.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// An ordered collection of key/value pairs inside the store
#[derive(Debug, Default, Clone)]
pub struct Bucket {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Last value handed out by `next_sequence`
    sequence: u64,
    /// Approximate size in bytes (keys + values)
    size: usize,
}

impl Bucket {
    /// Create a new empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Insert a value, returning the one it replaced
    pub(crate) fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        let added = key.len() + value.len();
        let key_len = key.len();
        let previous = self.entries.insert(key, value);
        self.size += added;
        if let Some(old) = &previous {
            self.size -= key_len + old.len();
        }
        previous
    }

    /// Remove a key, returning its value
    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let previous = self.entries.remove(key);
        if let Some(old) = &previous {
            self.size -= key.len() + old.len();
        }
        previous
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Last sequence value issued for this bucket (0 if none)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Iterate in ascending key order; `.rev()` for newest-first
    pub fn iter(&self) -> BucketIter<'_> {
        BucketIter {
            inner: self.entries.iter(),
        }
    }

    /// Last (highest) entry
    pub fn last(&self) -> Option<(&[u8], &[u8])> {
        self.entries
            .last_key_value()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

/// Ordered iterator over a bucket's entries
pub struct BucketIter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, Vec<u8>>,
}

impl<'a> Iterator for BucketIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for BucketIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl ExactSizeIterator for BucketIter<'_> {}
