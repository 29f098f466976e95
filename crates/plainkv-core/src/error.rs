// crates/plainkv-core/src/error.rs
// ============================================================================
// Module: PlainKV Errors
// Description: Error taxonomy shared by all PlainKV backends.
// Purpose: Provide stable, comparable sentinel errors and engine error kinds.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation failures are unit variants so callers can match or compare them
//! directly. Engine failures carry the backend message as a string, which keeps
//! the error type `Clone + Eq` regardless of the backend driver.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// PlainKV store errors.
///
/// # Invariants
/// - Sentinel variants are detected before any I/O and never wrap engine state.
/// - Error messages never embed stored values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlainKvError {
    /// Bucket name exceeds [`crate::MAX_BUCKET_BYTES`].
    #[error("bucket id too long")]
    BucketIdTooLong,
    /// Key exceeds [`crate::MAX_KEY_BYTES`].
    #[error("key too long")]
    KeyTooLong,
    /// Value exceeds [`crate::MAX_VALUE_BYTES`].
    #[error("value too large")]
    ValueTooLong,
    /// Key falls inside the reserved tally namespace.
    #[error("key uses the reserved tally prefix")]
    ReservedKey,
    /// Bucket is reserved for mime metadata.
    #[error("bucket is reserved for mime metadata")]
    ReservedBucket,
    /// Backing engine unreachable or connection descriptor malformed.
    #[error("plainkv connection error: {0}")]
    Connection(String),
    /// Transaction could not be started, committed, or rolled back.
    #[error("plainkv transaction error: {0}")]
    Transaction(String),
    /// Statement failed inside the backing engine.
    #[error("plainkv db error: {0}")]
    Db(String),
    /// Invalid configuration or arguments.
    #[error("plainkv invalid: {0}")]
    Invalid(String),
    /// Stored data could not be decoded.
    #[error("plainkv corrupt data: {0}")]
    Corrupt(String),
}

impl PlainKvError {
    /// Returns true for errors raised by input validation before any I/O.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BucketIdTooLong
                | Self::KeyTooLong
                | Self::ValueTooLong
                | Self::ReservedKey
                | Self::ReservedBucket
        )
    }
}
