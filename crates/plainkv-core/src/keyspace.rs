// crates/plainkv-core/src/keyspace.rs
// ============================================================================
// Module: PlainKV Keyspace
// Description: Reserved namespaces for mime metadata and tally counters.
// Purpose: Derive shadow record identities deterministically from user keys.
// Dependencies: crate::error
// ============================================================================

//! ## Overview
//! Mime labels and tallies are ordinary records living in reserved parts of
//! the keyspace:
//! - the mime label of key `K` is the value of `(MIME_BUCKET, K)`;
//! - the tally of key `K` in bucket `B` is the value of
//!   `(B, TALLY_PREFIX + K)`, stored as a decimal string.
//!
//! Keys starting with [`TALLY_PREFIX`] belong to tallies only. Data operations
//! reject them and listings hide them, so counter and data keys never collide.
//! Both reserved names match databases written by earlier releases.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::PlainKvError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bucket holding mime labels for every data key.
pub const MIME_BUCKET: &str = "--mime--";
/// Mime label reported for keys without an explicit label.
pub const DEFAULT_MIME: &str = "text/html";
/// Key prefix reserved for tally records.
pub const TALLY_PREFIX: &str = "_______#tally-";

// ============================================================================
// SECTION: Tally Keys
// ============================================================================

/// Returns the record key holding the tally for `key`.
#[must_use]
pub fn tally_key(key: &str) -> String {
    let mut reserved = String::with_capacity(TALLY_PREFIX.len() + key.len());
    reserved.push_str(TALLY_PREFIX);
    reserved.push_str(key);
    reserved
}

/// Returns true when `key` lies in the reserved tally namespace.
#[must_use]
pub fn is_tally_key(key: &str) -> bool {
    key.starts_with(TALLY_PREFIX)
}

// ============================================================================
// SECTION: Tally Codec
// ============================================================================

/// Encodes a tally as its decimal string bytes.
#[must_use]
pub fn encode_tally(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decodes a stored tally; `None` when the bytes are not a decimal `i64`.
#[must_use]
pub fn decode_tally(raw: &[u8]) -> Option<i64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

/// Applies `delta` to a tally.
///
/// # Errors
///
/// Returns [`PlainKvError::Invalid`] when the result leaves the `i64` range.
pub fn step_tally(current: i64, delta: i64) -> Result<i64, PlainKvError> {
    current
        .checked_add(delta)
        .ok_or_else(|| PlainKvError::Invalid(format!("tally overflow: {current} + {delta}")))
}
