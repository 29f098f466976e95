// crates/plainkv-core/src/memory.rs
// ============================================================================
// Module: PlainKV In-Memory Store
// Description: Simple in-memory PlainKv implementation for tests and examples.
// Purpose: Provide a deterministic store without external dependencies.
// Dependencies: crate::{error, interfaces, keyspace, record}
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`PlainKv`] for tests
//! and local demos. Transactions snapshot the record map on `begin` and restore
//! it on `rollback`. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::error::PlainKvError;
use crate::interfaces::PlainKv;
use crate::keyspace::DEFAULT_MIME;
use crate::keyspace::MIME_BUCKET;
use crate::keyspace::decode_tally;
use crate::keyspace::encode_tally;
use crate::keyspace::is_tally_key;
use crate::keyspace::step_tally;
use crate::keyspace::tally_key;
use crate::record::DEFAULT_BUCKET;
use crate::record::check_data_bucket;
use crate::record::check_data_key;
use crate::record::normalize_bucket;
use crate::record::validate_write;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Record map keyed by `(bucket, key)`.
type RecordMap = BTreeMap<(String, String), Vec<u8>>;

/// In-memory PlainKV store for tests and examples.
#[derive(Debug, Clone)]
pub struct InMemoryPlainKv {
    /// Live records.
    records: RecordMap,
    /// Records as of `begin`, present while a transaction is active.
    snapshot: Option<RecordMap>,
    /// Current bucket.
    bucket: String,
    /// Whether `open` has been called since the last `close`.
    open: bool,
}

impl Default for InMemoryPlainKv {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlainKv {
    /// Creates an empty in-memory store using the default bucket.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            snapshot: None,
            bucket: String::new(),
            open: false,
        }
    }

    /// Returns true while the store is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Returns the number of stored records, including mime and tally records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the effective current bucket.
    fn current_bucket(&self) -> &str {
        if self.bucket.is_empty() { DEFAULT_BUCKET } else { &self.bucket }
    }

    /// Reads a raw record.
    fn read(&self, bucket: &str, key: &str) -> Vec<u8> {
        self.records.get(&(bucket.to_string(), key.to_string())).cloned().unwrap_or_default()
    }

    /// Writes a raw record after validating its bounds.
    fn write(&mut self, bucket: &str, key: &str, value: &[u8]) -> Result<(), PlainKvError> {
        validate_write(bucket, key, value)?;
        self.open = true;
        self.records.insert((bucket.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    /// Reads the tally for a reserved key, creating it at `offset` when absent.
    fn read_tally(
        &mut self,
        bucket: &str,
        reserved: &str,
        offset: i64,
    ) -> Result<i64, PlainKvError> {
        let raw = self.read(bucket, reserved);
        if raw.is_empty() {
            self.write(bucket, reserved, &encode_tally(offset))?;
            return Ok(offset);
        }
        Ok(decode_tally(&raw).unwrap_or(0))
    }

    /// Applies `delta` to a tally and stores the result.
    fn step(&mut self, key: &str, delta: i64) -> Result<i64, PlainKvError> {
        let bucket = self.current_bucket().to_string();
        let reserved = tally_key(key);
        validate_write(&bucket, &reserved, b"")?;
        check_data_bucket(&bucket)?;
        let current = self.read_tally(&bucket, &reserved, 0)?;
        let next = step_tally(current, delta)?;
        self.write(&bucket, &reserved, &encode_tally(next))?;
        Ok(next)
    }
}

impl PlainKv for InMemoryPlainKv {
    fn open(&mut self) -> Result<(), PlainKvError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PlainKvError> {
        if let Some(snapshot) = self.snapshot.take() {
            self.records = snapshot;
        }
        self.open = false;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), PlainKvError> {
        if self.snapshot.is_some() {
            return Err(PlainKvError::Transaction("transaction already active".to_string()));
        }
        self.open = true;
        self.snapshot = Some(self.records.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PlainKvError> {
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PlainKvError> {
        if let Some(snapshot) = self.snapshot.take() {
            self.records = snapshot;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn set_bucket(&mut self, bucket: &str) {
        self.bucket = normalize_bucket(bucket);
    }

    fn bucket(&self) -> &str {
        self.current_bucket()
    }

    fn get(&mut self, key: &str) -> Result<Vec<u8>, PlainKvError> {
        let bucket = self.current_bucket();
        check_data_bucket(bucket)?;
        check_data_key(key)?;
        Ok(self.read(bucket, key))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PlainKvError> {
        let bucket = self.current_bucket().to_string();
        validate_write(&bucket, key, value)?;
        check_data_bucket(&bucket)?;
        check_data_key(key)?;
        self.write(&bucket, key, value)
    }

    fn del(&mut self, key: &str) -> Result<(), PlainKvError> {
        let bucket = self.current_bucket().to_string();
        check_data_bucket(&bucket)?;
        check_data_key(key)?;
        self.records.remove(&(bucket, key.to_string()));
        self.records.remove(&(MIME_BUCKET.to_string(), key.to_string()));
        Ok(())
    }

    fn get_mime(&mut self, key: &str) -> Result<String, PlainKvError> {
        check_data_key(key)?;
        let raw = self.read(MIME_BUCKET, key);
        if raw.is_empty() {
            return Ok(DEFAULT_MIME.to_string());
        }
        String::from_utf8(raw)
            .map_err(|_| PlainKvError::Corrupt(format!("mime label for {key} is not utf-8")))
    }

    fn set_mime(&mut self, key: &str, mime: &str) -> Result<(), PlainKvError> {
        validate_write(MIME_BUCKET, key, mime.as_bytes())?;
        check_data_key(key)?;
        self.write(MIME_BUCKET, key, mime.as_bytes())
    }

    fn list_keys(&mut self, pattern: &str) -> Result<Vec<String>, PlainKvError> {
        let bucket = self.current_bucket();
        check_data_bucket(bucket)?;
        Ok(self
            .records
            .keys()
            .filter(|(record_bucket, key)| {
                record_bucket == bucket && key.starts_with(pattern) && !is_tally_key(key)
            })
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn tally(&mut self, key: &str, offset: i64) -> Result<i64, PlainKvError> {
        let bucket = self.current_bucket().to_string();
        let reserved = tally_key(key);
        validate_write(&bucket, &reserved, b"")?;
        check_data_bucket(&bucket)?;
        self.read_tally(&bucket, &reserved, offset)
    }

    fn tally_incr(&mut self, key: &str) -> Result<i64, PlainKvError> {
        self.step(key, 1)
    }

    fn tally_decr(&mut self, key: &str) -> Result<i64, PlainKvError> {
        self.step(key, -1)
    }

    fn tally_reset(&mut self, key: &str) -> Result<(), PlainKvError> {
        let bucket = self.current_bucket().to_string();
        let reserved = tally_key(key);
        validate_write(&bucket, &reserved, b"")?;
        check_data_bucket(&bucket)?;
        self.write(&bucket, &reserved, &encode_tally(0))
    }
}
