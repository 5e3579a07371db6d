//! Tests for the store path (dedup, insert, trim)
//!
//! These tests verify:
//! - Newest-first ordering and monotonic IDs
//! - The `max_items` bound, including zero
//! - The dedup window, including zero
//! - Blank payloads are ignored
//! - A failed store leaves the history untouched

use std::path::PathBuf;
use std::time::Duration;

use clipstash::store::{Options, SyncStrategy};
use clipstash::{Access, History, StashError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_history() -> (TempDir, PathBuf, History) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");
    let history = History::with_options(
        &path,
        Options::default().sync_strategy(SyncStrategy::Never),
    )
    .unwrap();
    (temp_dir, path, history)
}

fn payloads(history: &History) -> Vec<Vec<u8>> {
    history
        .entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.payload)
        .collect()
}

fn ids(history: &History) -> Vec<u64> {
    history
        .entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect()
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_store_newest_first() {
    let (_temp, _path, history) = setup_temp_history();

    for payload in ["one", "two", "three"] {
        history.store(payload.as_bytes(), 100, 750).unwrap();
    }

    assert_eq!(
        payloads(&history),
        vec![b"three".to_vec(), b"two".to_vec(), b"one".to_vec()]
    );
    assert_eq!(ids(&history), vec![3, 2, 1]);
}

#[test]
fn test_ids_are_never_reused() {
    let (_temp, _path, history) = setup_temp_history();

    let first = history.store(b"a", 100, 750).unwrap().unwrap();
    let second = history.store(b"b", 100, 750).unwrap().unwrap();
    history.delete(&[second]).unwrap();
    let third = history.store(b"c", 100, 750).unwrap().unwrap();

    assert_eq!((first, second, third), (1, 2, 3));
}

#[test]
fn test_ids_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("db");
    let timeout = Duration::from_secs(1);

    {
        let history = History::open(&path, Access::ReadWrite, timeout).unwrap();
        history.store(b"a", 100, 750).unwrap();
        history.store(b"b", 100, 750).unwrap();
        history.wipe().unwrap();
    }

    let history = History::open(&path, Access::ReadWrite, timeout).unwrap();
    assert_eq!(history.store(b"c", 100, 750).unwrap(), Some(3));
}

#[test]
fn test_binary_payload_stored_exactly() {
    let (_temp, _path, history) = setup_temp_history();
    let payload: Vec<u8> = (0..=255u8).rev().collect();

    let id = history.store(&payload, 100, 750).unwrap().unwrap();

    assert_eq!(history.get(id).unwrap(), Some(payload));
}

// =============================================================================
// Trim Tests
// =============================================================================

#[test]
fn test_trim_keeps_newest() {
    let (_temp, _path, history) = setup_temp_history();

    for i in 0..20u64 {
        history.store(&i.to_be_bytes(), 100, 10).unwrap();
    }

    let entries = history.entries().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries.last().unwrap().payload, 10u64.to_be_bytes().to_vec());
    assert_eq!(entries.first().unwrap().payload, 19u64.to_be_bytes().to_vec());
}

#[test]
fn test_trim_counts_entries_not_ids() {
    let (_temp, _path, history) = setup_temp_history();

    for i in 0..6u64 {
        history.store(&i.to_be_bytes(), 100, 750).unwrap();
    }
    // Leave gaps in the ID space
    history.delete(&[2, 4]).unwrap();

    history.store(b"new", 100, 3).unwrap();

    assert_eq!(ids(&history), vec![7, 6, 5]);
}

#[test]
fn test_max_items_zero_evicts_everything() {
    let (_temp, _path, history) = setup_temp_history();
    history.store(b"old", 100, 750).unwrap();

    let id = history.store(b"new", 100, 0).unwrap();

    assert_eq!(id, Some(2));
    assert!(history.is_empty().unwrap());
}

#[test]
fn test_lowering_max_items_trims_on_next_store() {
    let (_temp, _path, history) = setup_temp_history();
    for i in 0..8u64 {
        history.store(&i.to_be_bytes(), 100, 750).unwrap();
    }

    history.store(b"x", 100, 2).unwrap();

    assert_eq!(history.len().unwrap(), 2);
}

// =============================================================================
// Dedup Tests
// =============================================================================

#[test]
fn test_duplicate_moves_to_front() {
    let (_temp, _path, history) = setup_temp_history();

    for payload in ["hello", "multiple", "multiple", "multiple", "hello"] {
        history.store(payload.as_bytes(), 100, 750).unwrap();
    }

    assert_eq!(
        payloads(&history),
        vec![b"hello".to_vec(), b"multiple".to_vec()]
    );
    assert_eq!(ids(&history), vec![5, 4]);
}

#[test]
fn test_dedup_window_bounds_search() {
    let (_temp, _path, history) = setup_temp_history();

    history.store(b"target", 100, 750).unwrap();
    history.store(b"x", 100, 750).unwrap();
    history.store(b"y", 100, 750).unwrap();

    // "target" is third newest; a window of two does not reach it
    history.store(b"target", 2, 750).unwrap();
    assert_eq!(history.len().unwrap(), 4);

    // A window of three does
    history.store(b"target", 3, 750).unwrap();
    assert_eq!(
        payloads(&history),
        vec![b"target".to_vec(), b"y".to_vec(), b"x".to_vec(), b"target".to_vec()]
    );
}

#[test]
fn test_dedup_window_zero_disables() {
    let (_temp, _path, history) = setup_temp_history();

    history.store(b"same", 0, 750).unwrap();
    history.store(b"same", 0, 750).unwrap();

    assert_eq!(history.len().unwrap(), 2);
}

#[test]
fn test_dedup_compares_exact_bytes() {
    let (_temp, _path, history) = setup_temp_history();

    history.store(b"value", 100, 750).unwrap();
    history.store(b"value ", 100, 750).unwrap();
    history.store(b"Value", 100, 750).unwrap();

    assert_eq!(history.len().unwrap(), 3);
}

// =============================================================================
// Blank Payload Tests
// =============================================================================

#[test]
fn test_blank_payloads_ignored() {
    let (_temp, _path, history) = setup_temp_history();

    assert_eq!(history.store(b"", 100, 750).unwrap(), None);
    assert_eq!(history.store(b"  \n\t\r ", 100, 750).unwrap(), None);

    assert!(history.is_empty().unwrap());
    // The sequence did not move
    assert_eq!(history.store(b"x", 100, 750).unwrap(), Some(1));
}

#[test]
fn test_vertical_tab_and_unicode_spaces_are_blank() {
    let (_temp, _path, history) = setup_temp_history();

    let payloads: [&[u8]; 5] = [
        b"\x0b",
        b" \x0b\n",
        b"\x0c",
        "\u{a0}".as_bytes(),
        "\u{3000}\n".as_bytes(),
    ];
    for payload in payloads {
        assert_eq!(history.store(payload, 100, 750).unwrap(), None, "{:?}", payload);
    }

    assert!(history.is_empty().unwrap());
    assert_eq!(history.store(b"x", 100, 750).unwrap(), Some(1));
}

#[test]
fn test_invalid_utf8_between_spaces_is_stored() {
    let (_temp, _path, history) = setup_temp_history();

    assert_eq!(history.store(b" \xff ", 100, 750).unwrap(), Some(1));
    assert_eq!(history.get(1).unwrap(), Some(b" \xff ".to_vec()));
}

#[test]
fn test_padded_payload_stored_verbatim() {
    let (_temp, _path, history) = setup_temp_history();

    let id = history.store(b"  padded \n", 100, 750).unwrap().unwrap();

    assert_eq!(history.get(id).unwrap(), Some(b"  padded \n".to_vec()));
}

// =============================================================================
// Atomicity Tests
// =============================================================================

#[test]
fn test_failed_store_rolls_back_dedup_and_sequence() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("db");
    let options = Options::default().sync_strategy(SyncStrategy::Never);

    {
        let history = History::with_options(&path, options.clone()).unwrap();
        history.store(b"a long payload", 100, 750).unwrap();
    }

    // Reopen with a value limit the existing payload exceeds: the dedup step
    // deletes the old copy, then the insert fails.
    let history = History::with_options(&path, options.max_value_size(4)).unwrap();
    let result = history.store(b"a long payload", 100, 750);

    assert!(matches!(result, Err(StashError::ValueTooLarge { .. })));
    assert_eq!(payloads(&history), vec![b"a long payload".to_vec()]);
    assert_eq!(history.store(b"ok", 100, 750).unwrap(), Some(2));
}

#[test]
fn test_read_only_history_rejects_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("db");
    let timeout = Duration::from_secs(1);
    drop(History::open(&path, Access::ReadWrite, timeout).unwrap());

    let history = History::open(&path, Access::ReadOnly, timeout).unwrap();

    assert_eq!(history.access(), Access::ReadOnly);
    assert!(matches!(
        history.store(b"x", 100, 750),
        Err(StashError::ReadOnly)
    ));
}
