// crates/plainkv-store-sqlite/src/connection.rs
// ============================================================================
// Module: SQLite Connection Manager
// Description: Lazily opened r2d2 pool of configured SQLite connections.
// Purpose: Own the pooled engine handle and guarantee the schema exists.
// Dependencies: plainkv-core, r2d2, rusqlite
// ============================================================================

//! ## Overview
//! [`ConnectionManager`] owns at most one pool. Opening is idempotent: the
//! first call probes the database, creates the table, and builds the pool.
//! Every pooled connection applies the busy timeout and descriptor pragmas.
//! A connection handed back while still inside a transaction is reported as
//! broken, so the pool discards it instead of reusing it mid-transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use plainkv_core::PlainKvError;
use r2d2::ManageConnection;
use r2d2::Pool;
use r2d2::PooledConnection;
use rusqlite::Connection;
use rusqlite::OpenFlags;

use crate::config::SqlitePlainKvConfig;
use crate::descriptor::ConnectionDescriptor;
use crate::descriptor::TxLock;
use crate::schema::Statements;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connection checked out of the store pool.
pub(crate) type PooledSqlite = PooledConnection<SqliteConnector>;

// ============================================================================
// SECTION: Connector
// ============================================================================

/// r2d2 connection factory for descriptor-configured `SQLite` connections.
#[derive(Debug, Clone)]
pub(crate) struct SqliteConnector {
    /// Parsed connection descriptor.
    descriptor: ConnectionDescriptor,
    /// Busy timeout applied before descriptor pragmas.
    busy_timeout: Duration,
}

impl ManageConnection for SqliteConnector {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        let connection = if self.descriptor.in_memory() {
            Connection::open_in_memory()?
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            Connection::open_with_flags(self.descriptor.path(), flags)?
        };
        connection.busy_timeout(self.busy_timeout)?;
        for pragma in self.descriptor.pragmas() {
            connection.execute_batch(&pragma.statement())?;
        }
        Ok(connection)
    }

    fn is_valid(&self, connection: &mut Connection) -> Result<(), rusqlite::Error> {
        connection.query_row("SELECT 1", [], |_| Ok(()))
    }

    fn has_broken(&self, connection: &mut Connection) -> bool {
        !connection.is_autocommit()
    }
}

// ============================================================================
// SECTION: Connection Manager
// ============================================================================

/// Owner of the store's connection pool.
///
/// # Invariants
/// - `pool` is `Some` only after the schema has been ensured.
/// - `tx_lock` reflects the descriptor of the open pool.
pub(crate) struct ConnectionManager {
    /// Open pool, if any.
    pool: Option<Pool<SqliteConnector>>,
    /// `BEGIN` mode parsed from the descriptor.
    tx_lock: TxLock,
}

impl ConnectionManager {
    /// Creates a closed manager.
    pub(crate) const fn new() -> Self {
        Self {
            pool: None,
            tx_lock: TxLock::Deferred,
        }
    }

    /// Returns true while a pool is open.
    pub(crate) const fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    /// Returns the explicit transaction lock mode.
    pub(crate) const fn tx_lock(&self) -> TxLock {
        self.tx_lock
    }

    /// Opens the pool and ensures the schema; returns false when already open.
    pub(crate) fn open(
        &mut self,
        config: &SqlitePlainKvConfig,
        statements: &Statements,
    ) -> Result<bool, PlainKvError> {
        if self.pool.is_some() {
            return Ok(false);
        }
        let descriptor = ConnectionDescriptor::parse(&config.dsn)?;
        let tx_lock = descriptor.tx_lock();
        let connector = SqliteConnector {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            descriptor,
        };
        let builder = Pool::builder()
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .test_on_check_out(true);
        let pool = if connector.descriptor.in_memory() {
            // One connection per in-memory database; it must never be recycled.
            let pool = builder
                .max_size(1)
                .min_idle(Some(1))
                .max_lifetime(None)
                .idle_timeout(None)
                .build(connector)
                .map_err(|err| PlainKvError::Connection(err.to_string()))?;
            let connection =
                pool.get().map_err(|err| PlainKvError::Connection(err.to_string()))?;
            ensure_schema(&connection, statements)?;
            drop(connection);
            pool
        } else {
            let probe =
                connector.connect().map_err(|err| PlainKvError::Connection(err.to_string()))?;
            ensure_schema(&probe, statements)?;
            drop(probe);
            builder
                .max_size(config.max_open_connections)
                .min_idle(Some(config.min_idle_connections))
                .max_lifetime(Some(Duration::from_millis(config.connection_max_lifetime_ms)))
                .build_unchecked(connector)
        };
        self.pool = Some(pool);
        self.tx_lock = tx_lock;
        Ok(true)
    }

    /// Drops the pool; returns false when already closed.
    pub(crate) fn close(&mut self) -> bool {
        self.pool.take().is_some()
    }

    /// Checks a connection out of the open pool.
    pub(crate) fn checkout(&self) -> Result<PooledSqlite, PlainKvError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| PlainKvError::Connection("store is not open".to_string()))?;
        pool.get().map_err(|err| PlainKvError::Connection(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates the record table when missing.
pub(crate) fn ensure_schema(
    connection: &Connection,
    statements: &Statements,
) -> Result<(), PlainKvError> {
    connection
        .execute_batch(&statements.create_table)
        .map_err(|err| PlainKvError::Db(err.to_string()))
}
