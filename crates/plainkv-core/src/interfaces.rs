// crates/plainkv-core/src/interfaces.rs
// ============================================================================
// Module: PlainKV Interfaces
// Description: Backend-agnostic key-value, mime, tally, and transaction API.
// Purpose: Define the contract every PlainKV store implements.
// Dependencies: crate::error
// ============================================================================

//! ## Overview
//! [`PlainKv`] is the full caller surface of a store instance. Every method
//! takes `&mut self`: a store owns its connection and transaction state, and a
//! transaction handle must never be driven from two threads at once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::PlainKvError;

// ============================================================================
// SECTION: Store Interface
// ============================================================================

/// Bucket-scoped key-value store with mime labels, tallies, and transactions.
///
/// # Invariants
/// - Operations issued while a transaction is active run inside it.
/// - Operations issued otherwise run as their own implicit unit of work.
/// - Missing keys read as empty values, never as errors.
pub trait PlainKv {
    /// Opens the backing storage; a no-op when already open.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Connection`] when storage cannot be reached.
    fn open(&mut self) -> Result<(), PlainKvError>;

    /// Releases the backing storage, discarding (never committing) any
    /// active transaction. A no-op when already closed.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] when the storage fails to release.
    fn close(&mut self) -> Result<(), PlainKvError>;

    /// Starts an explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Transaction`] when a transaction is already
    /// active or the engine refuses to start one.
    fn begin(&mut self) -> Result<(), PlainKvError>;

    /// Commits the explicit transaction; a no-op when none is active.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Transaction`] when the engine rejects the commit.
    fn commit(&mut self) -> Result<(), PlainKvError>;

    /// Rolls back the explicit transaction; a no-op when none is active.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Transaction`] when the engine rejects the rollback.
    fn rollback(&mut self) -> Result<(), PlainKvError>;

    /// Returns true while an explicit transaction is active.
    fn in_transaction(&self) -> bool;

    /// Selects the bucket used by subsequent operations (`""` means default).
    fn set_bucket(&mut self, bucket: &str);

    /// Returns the current bucket.
    fn bucket(&self) -> &str;

    /// Reads a value from the current bucket; empty when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on reserved names or engine failures.
    fn get(&mut self, key: &str) -> Result<Vec<u8>, PlainKvError>;

    /// Creates or replaces a value in the current bucket.
    ///
    /// # Errors
    ///
    /// Returns a sentinel error when a size bound is exceeded, or
    /// [`PlainKvError`] on engine failures.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PlainKvError>;

    /// Deletes a value from the current bucket together with its mime label.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on reserved names or engine failures.
    fn del(&mut self, key: &str) -> Result<(), PlainKvError>;

    /// Returns the mime label of a key, or [`crate::DEFAULT_MIME`] when unset.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on reserved names or engine failures.
    fn get_mime(&mut self, key: &str) -> Result<String, PlainKvError>;

    /// Sets the mime label of a key.
    ///
    /// # Errors
    ///
    /// Returns a sentinel error when a size bound is exceeded, or
    /// [`PlainKvError`] on engine failures.
    fn set_mime(&mut self, key: &str, mime: &str) -> Result<(), PlainKvError>;

    /// Lists keys of the current bucket starting with `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on engine failures.
    fn list_keys(&mut self, pattern: &str) -> Result<Vec<String>, PlainKvError>;

    /// Returns the tally of a key, creating it at `offset` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on engine failures.
    fn tally(&mut self, key: &str, offset: i64) -> Result<i64, PlainKvError>;

    /// Increments a tally and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on overflow or engine failures.
    fn tally_incr(&mut self, key: &str) -> Result<i64, PlainKvError>;

    /// Decrements a tally and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on overflow or engine failures.
    fn tally_decr(&mut self, key: &str) -> Result<i64, PlainKvError>;

    /// Resets a tally to zero.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError`] on engine failures.
    fn tally_reset(&mut self, key: &str) -> Result<(), PlainKvError>;
}
