// crates/plainkv-core/src/record.rs
// ============================================================================
// Module: PlainKV Records
// Description: Record size limits and write-time validation.
// Purpose: Enforce bucket, key, and value bounds before touching storage.
// Dependencies: crate::{error, keyspace}
// ============================================================================

//! ## Overview
//! A record is `(bucket, key, value)` with `(bucket, key)` unique. Limits are
//! checked when writing only; oversized rows written by older tools remain
//! readable. Lengths are measured in bytes. Writes check these limits before
//! the reserved bucket and key rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::PlainKvError;
use crate::keyspace::MIME_BUCKET;
use crate::keyspace::is_tally_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bucket used when the caller configures an empty bucket name.
pub const DEFAULT_BUCKET: &str = "default";
/// Maximum bucket name length in bytes.
pub const MAX_BUCKET_BYTES: usize = 50;
/// Maximum key length in bytes.
pub const MAX_KEY_BYTES: usize = 300;
/// Maximum value size in bytes (`MEDIUMBLOB` capacity).
pub const MAX_VALUE_BYTES: usize = 16_777_215;

// ============================================================================
// SECTION: Buckets
// ============================================================================

/// Normalizes a caller bucket name, mapping `""` to [`DEFAULT_BUCKET`].
#[must_use]
pub fn normalize_bucket(bucket: &str) -> String {
    if bucket.is_empty() { DEFAULT_BUCKET.to_string() } else { bucket.to_string() }
}

/// Rejects the reserved mime bucket as a data bucket.
///
/// # Errors
///
/// Returns [`PlainKvError::ReservedBucket`] for the mime bucket.
pub fn check_data_bucket(bucket: &str) -> Result<(), PlainKvError> {
    if bucket == MIME_BUCKET {
        return Err(PlainKvError::ReservedBucket);
    }
    Ok(())
}

/// Rejects keys inside the reserved tally namespace.
///
/// # Errors
///
/// Returns [`PlainKvError::ReservedKey`] when the key carries the tally prefix.
pub fn check_data_key(key: &str) -> Result<(), PlainKvError> {
    if is_tally_key(key) {
        return Err(PlainKvError::ReservedKey);
    }
    Ok(())
}

// ============================================================================
// SECTION: Write Validation
// ============================================================================

/// Validates record bounds for a write.
///
/// Checks run in bucket, key, value order so the first violated bound wins.
///
/// # Errors
///
/// Returns the matching sentinel error when a bound is exceeded.
pub const fn validate_write(bucket: &str, key: &str, value: &[u8]) -> Result<(), PlainKvError> {
    if bucket.len() > MAX_BUCKET_BYTES {
        return Err(PlainKvError::BucketIdTooLong);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(PlainKvError::KeyTooLong);
    }
    if value.len() > MAX_VALUE_BYTES {
        return Err(PlainKvError::ValueTooLong);
    }
    Ok(())
}
