// crates/plainkv-core/tests/memory_store.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Validate the in-memory PlainKv reference implementation.
// Purpose: Pin the contract semantics every backend must share.
// Dependencies: plainkv-core
// ============================================================================

//! ## Overview
//! Behavioral tests for [`InMemoryPlainKv`]: record round trips, sentinel
//! validation, mime coupling on delete, prefix listing, tallies, and
//! snapshot transactions.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use plainkv_core::DEFAULT_MIME;
use plainkv_core::InMemoryPlainKv;
use plainkv_core::MAX_BUCKET_BYTES;
use plainkv_core::MAX_KEY_BYTES;
use plainkv_core::MIME_BUCKET;
use plainkv_core::PlainKv;
use plainkv_core::PlainKvError;
use plainkv_core::keyspace::tally_key;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn memory_store_roundtrip_and_missing_key() {
    let mut store = InMemoryPlainKv::new();
    store.set("sample_key", b"Sample value").unwrap();
    assert_eq!(store.get("sample_key").unwrap(), b"Sample value".to_vec());
    assert!(store.get("never_set").unwrap().is_empty());
}

#[test]
fn memory_store_rejects_oversized_inputs_without_writing() {
    let mut store = InMemoryPlainKv::new();
    let long_key = "k".repeat(MAX_KEY_BYTES + 1);
    assert_eq!(store.set(&long_key, b"v"), Err(PlainKvError::KeyTooLong));
    store.set_bucket(&"b".repeat(MAX_BUCKET_BYTES + 1));
    assert_eq!(store.set("key", b"v"), Err(PlainKvError::BucketIdTooLong));
    assert_eq!(store.record_count(), 0);
}

#[test]
fn memory_store_del_removes_mime() {
    let mut store = InMemoryPlainKv::new();
    store.set("page", b"<p>hi</p>").unwrap();
    store.set_mime("page", "application/json").unwrap();
    assert_eq!(store.get_mime("page").unwrap(), "application/json");
    store.del("page").unwrap();
    assert!(store.get("page").unwrap().is_empty());
    assert_eq!(store.get_mime("page").unwrap(), DEFAULT_MIME);
}

#[test]
fn memory_store_lists_prefix_in_current_bucket_only() {
    let mut store = InMemoryPlainKv::new();
    store.set("sample-1", b"a").unwrap();
    store.set("sample-2", b"b").unwrap();
    store.set("other", b"c").unwrap();
    store.tally("sample-counter", 1).unwrap();
    store.set_bucket("elsewhere");
    store.set("sample-3", b"d").unwrap();
    store.set_bucket("");
    assert_eq!(store.bucket(), "default");
    let mut keys = store.list_keys("sample").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["sample-1".to_string(), "sample-2".to_string()]);
    assert!(store.list_keys("missing").unwrap().is_empty());
}

#[test]
fn memory_store_reserved_names_are_rejected() {
    let mut store = InMemoryPlainKv::new();
    assert_eq!(store.set(&tally_key("hits"), b"1"), Err(PlainKvError::ReservedKey));
    store.set_bucket(MIME_BUCKET);
    assert_eq!(store.set("key", b"v"), Err(PlainKvError::ReservedBucket));
}

#[test]
fn memory_store_tally_sequence() {
    let mut store = InMemoryPlainKv::new();
    assert_eq!(store.tally("visits", 5).unwrap(), 5);
    assert_eq!(store.tally("visits", 99).unwrap(), 5);
    for expected in 6..=15 {
        assert_eq!(store.tally_incr("visits").unwrap(), expected);
    }
    for expected in (5..=14).rev() {
        assert_eq!(store.tally_decr("visits").unwrap(), expected);
    }
    store.tally_reset("visits").unwrap();
    assert_eq!(store.tally("visits", 7).unwrap(), 0);
    assert_eq!(store.tally_decr("fresh").unwrap(), -1);
}

#[test]
fn memory_store_rollback_restores_pre_begin_state() {
    let mut store = InMemoryPlainKv::new();
    store.set("kept", b"before").unwrap();
    store.begin().unwrap();
    store.set("kept", b"after").unwrap();
    store.set("added", b"x").unwrap();
    store.tally_incr("hits").unwrap();
    store.del("kept").unwrap();
    store.rollback().unwrap();
    assert!(!store.in_transaction());
    assert_eq!(store.get("kept").unwrap(), b"before".to_vec());
    assert!(store.get("added").unwrap().is_empty());
    assert_eq!(store.record_count(), 1);
}

#[test]
fn memory_store_commit_and_rollback_without_transaction_are_noops() {
    let mut store = InMemoryPlainKv::new();
    store.commit().unwrap();
    store.rollback().unwrap();
    store.begin().unwrap();
    assert!(matches!(store.begin(), Err(PlainKvError::Transaction(_))));
    store.set("k", b"v").unwrap();
    store.commit().unwrap();
    assert_eq!(store.get("k").unwrap(), b"v".to_vec());
}

#[test]
fn memory_store_close_discards_active_transaction() {
    let mut store = InMemoryPlainKv::new();
    store.open().unwrap();
    assert!(store.is_open());
    store.begin().unwrap();
    store.set("k", b"v").unwrap();
    store.close().unwrap();
    assert!(!store.is_open());
    assert!(!store.in_transaction());
    assert!(store.get("k").unwrap().is_empty());
}

#[test]
fn memory_store_size_limits_checked_before_reserved_names() {
    let mut store = InMemoryPlainKv::new();
    let reserved_long = tally_key(&"k".repeat(MAX_KEY_BYTES));
    assert_eq!(store.set(&reserved_long, b"v"), Err(PlainKvError::KeyTooLong));
    assert_eq!(store.set_mime(&reserved_long, "text/plain"), Err(PlainKvError::KeyTooLong));
    store.set_bucket(MIME_BUCKET);
    let long_key = "k".repeat(MAX_KEY_BYTES + 1);
    assert_eq!(store.set(&long_key, b"v"), Err(PlainKvError::KeyTooLong));
    assert_eq!(store.tally(&"k".repeat(MAX_KEY_BYTES), 1), Err(PlainKvError::KeyTooLong));
    assert_eq!(store.tally_reset("hits"), Err(PlainKvError::ReservedBucket));
    assert_eq!(store.record_count(), 0);
}

#[test]
fn memory_store_list_keys_matches_nul_bytes() {
    let mut store = InMemoryPlainKv::new();
    store.set("a\0b", b"v").unwrap();
    store.set("azzz", b"v").unwrap();
    assert_eq!(store.list_keys("a\0b").unwrap(), vec!["a\0b".to_string()]);
}
