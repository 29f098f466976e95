// crates/plainkv-store-sqlite/src/unit.rs
// ============================================================================
// Module: SQLite Units of Work
// Description: Explicit transaction state and per-operation units of work.
// Purpose: Route every operation to the active transaction or an implicit one.
// Dependencies: plainkv-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`TransactionController`] is the `Inactive`/`Active` state machine behind
//! `begin`, `commit`, and `rollback`. While active it pins one pooled
//! connection that has executed `BEGIN`.
//!
//! Every store operation acquires a [`UnitOfWork`]:
//! - `Explicit` borrows the active transaction connection; finishing it is a
//!   no-op because the caller owns the transaction.
//! - `Implicit` checks a connection out of the pool. Atomic units wrap their
//!   statements in `BEGIN IMMEDIATE ... COMMIT`; a unit dropped before
//!   [`UnitOfWork::finish`] rolls back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use plainkv_core::PlainKvError;
use rusqlite::Connection;

use crate::connection::ConnectionManager;
use crate::connection::PooledSqlite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Begins an implicit atomic unit holding the write lock from the start.
const BEGIN_IMPLICIT_SQL: &str = "BEGIN IMMEDIATE";
/// Commits a transaction.
const COMMIT_SQL: &str = "COMMIT";
/// Rolls back a transaction.
const ROLLBACK_SQL: &str = "ROLLBACK";

// ============================================================================
// SECTION: Transaction Controller
// ============================================================================

/// Explicit transaction state of one store instance.
///
/// # Invariants
/// - `active` is `Some` exactly while the engine holds an open transaction on
///   that connection.
pub(crate) struct TransactionController {
    /// Connection pinned by the active transaction.
    active: Option<PooledSqlite>,
}

impl TransactionController {
    /// Creates an inactive controller.
    pub(crate) const fn new() -> Self {
        Self {
            active: None,
        }
    }

    /// Returns true while a transaction is active.
    pub(crate) const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a transaction on a fresh pooled connection.
    pub(crate) fn begin(&mut self, connections: &ConnectionManager) -> Result<(), PlainKvError> {
        if self.active.is_some() {
            return Err(PlainKvError::Transaction("transaction already active".to_string()));
        }
        let connection = connections.checkout()?;
        connection
            .execute_batch(connections.tx_lock().begin_sql())
            .map_err(|err| PlainKvError::Transaction(err.to_string()))?;
        self.active = Some(connection);
        Ok(())
    }

    /// Commits the active transaction; returns false when none was active.
    pub(crate) fn commit(&mut self) -> Result<bool, PlainKvError> {
        self.finalize(COMMIT_SQL)
    }

    /// Rolls back the active transaction; returns false when none was active.
    pub(crate) fn rollback(&mut self) -> Result<bool, PlainKvError> {
        self.finalize(ROLLBACK_SQL)
    }

    /// Rolls back and forgets the active transaction, ignoring engine errors.
    ///
    /// Returns true when a transaction was discarded.
    pub(crate) fn discard(&mut self) -> bool {
        let Some(connection) = self.active.take() else {
            return false;
        };
        if let Err(err) = connection.execute_batch(ROLLBACK_SQL) {
            tracing::warn!(error = %err, "rollback of discarded transaction failed");
        }
        true
    }

    /// Executes `sql` to end the active transaction.
    ///
    /// On failure the transaction stays active when the engine still holds it,
    /// so the caller can retry or roll back.
    fn finalize(&mut self, sql: &str) -> Result<bool, PlainKvError> {
        let Some(connection) = self.active.take() else {
            return Ok(false);
        };
        if let Err(err) = connection.execute_batch(sql) {
            if !connection.is_autocommit() {
                self.active = Some(connection);
            }
            return Err(PlainKvError::Transaction(err.to_string()));
        }
        Ok(true)
    }
}

// ============================================================================
// SECTION: Unit Of Work
// ============================================================================

/// How an implicit unit groups its statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitKind {
    /// Each statement auto-commits on its own.
    Statement,
    /// All statements commit together or not at all.
    Atomic,
}

/// Connection a unit of work executes on.
enum UnitTarget<'a> {
    /// The caller's explicit transaction.
    Explicit(&'a Connection),
    /// A pooled connection owned by this unit.
    Implicit(PooledSqlite),
}

/// Execution context acquired by every store operation.
pub(crate) struct UnitOfWork<'a> {
    /// Target connection.
    target: UnitTarget<'a>,
    /// True while an implicit transaction awaits commit.
    pending: bool,
}

impl<'a> UnitOfWork<'a> {
    /// Acquires the active transaction, or a fresh implicit unit of `kind`.
    pub(crate) fn acquire(
        transaction: &'a TransactionController,
        connections: &ConnectionManager,
        kind: UnitKind,
    ) -> Result<Self, PlainKvError> {
        if let Some(connection) = transaction.active.as_deref() {
            return Ok(Self {
                target: UnitTarget::Explicit(connection),
                pending: false,
            });
        }
        let connection = connections.checkout()?;
        let pending = kind == UnitKind::Atomic;
        if pending {
            connection
                .execute_batch(BEGIN_IMPLICIT_SQL)
                .map_err(|err| PlainKvError::Transaction(err.to_string()))?;
        }
        Ok(Self {
            target: UnitTarget::Implicit(connection),
            pending,
        })
    }

    /// Returns the connection statements run on.
    pub(crate) fn connection(&self) -> &Connection {
        match &self.target {
            UnitTarget::Explicit(connection) => *connection,
            UnitTarget::Implicit(pooled) => &**pooled,
        }
    }

    /// Completes the unit, committing an implicit atomic transaction.
    pub(crate) fn finish(mut self) -> Result<(), PlainKvError> {
        if self.pending {
            self.connection()
                .execute_batch(COMMIT_SQL)
                .map_err(|err| PlainKvError::Transaction(err.to_string()))?;
            self.pending = false;
        }
        Ok(())
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if self.pending
            && let Err(err) = self.connection().execute_batch(ROLLBACK_SQL)
        {
            tracing::warn!(error = %err, "implicit rollback failed");
        }
    }
}
