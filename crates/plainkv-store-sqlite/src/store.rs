// crates/plainkv-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Key-Value Store
// Description: PlainKv implementation over a pooled SQLite database.
// Purpose: Bucket-scoped records, mime labels, listings, and transactions.
// Dependencies: plainkv-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`SqlitePlainKv`] implements [`PlainKv`] on one `SQLite` table. Each call
//! validates its inputs without I/O, lazily opens the pool, then runs inside a
//! unit of work: the active explicit transaction when there is one, otherwise
//! an implicit unit released at the end of the call. In auto-close mode the
//! pool is dropped after every call made outside a transaction.
//!
//! A store instance owns its pool and transaction; methods take `&mut self`,
//! so one instance is never driven from two threads at once. Use separate
//! instances for parallel work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use plainkv_core::DEFAULT_MIME;
use plainkv_core::MIME_BUCKET;
use plainkv_core::PlainKv;
use plainkv_core::PlainKvError;
use plainkv_core::TALLY_PREFIX;
use plainkv_core::keyspace::tally_key;
use plainkv_core::record::check_data_bucket;
use plainkv_core::record::check_data_key;
use plainkv_core::record::normalize_bucket;
use plainkv_core::record::validate_write;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::types::ValueRef;

use crate::config::SqlitePlainKvConfig;
use crate::connection::ConnectionManager;
use crate::connection::ensure_schema;
use crate::schema::Statements;
use crate::schema::TableName;
use crate::tally;
use crate::unit::TransactionController;
use crate::unit::UnitKind;
use crate::unit::UnitOfWork;

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed bucket key-value store.
///
/// # Invariants
/// - `statements` always match `table`.
/// - `bucket` is never empty.
/// - An active transaction implies an open pool.
pub struct SqlitePlainKv {
    /// Store configuration.
    config: SqlitePlainKvConfig,
    /// Validated table name.
    table: TableName,
    /// Statements bound to `table`.
    statements: Statements,
    /// Current bucket.
    bucket: String,
    /// Pool owner.
    connections: ConnectionManager,
    /// Explicit transaction state.
    transaction: TransactionController,
}

impl SqlitePlainKv {
    /// Creates a store for `dsn` with default limits. Nothing is opened until
    /// the first operation.
    #[must_use]
    pub fn new(dsn: impl Into<String>, auto_close: bool) -> Self {
        let mut config = SqlitePlainKvConfig::new(dsn);
        config.auto_close = auto_close;
        let table = TableName::default();
        Self {
            statements: Statements::for_table(&table),
            bucket: normalize_bucket(&config.bucket),
            config,
            table,
            connections: ConnectionManager::new(),
            transaction: TransactionController::new(),
        }
    }

    /// Creates a store from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Invalid`] when the configuration is invalid.
    pub fn with_config(config: SqlitePlainKvConfig) -> Result<Self, PlainKvError> {
        config.validate()?;
        let table = TableName::new(&config.table_name)?;
        Ok(Self {
            statements: Statements::for_table(&table),
            bucket: normalize_bucket(&config.bucket),
            config,
            table,
            connections: ConnectionManager::new(),
            transaction: TransactionController::new(),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqlitePlainKvConfig {
        &self.config
    }

    /// Returns true while the pool is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.connections.is_open()
    }

    /// Returns the table holding all records.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    /// Switches the table used by subsequent operations.
    ///
    /// When the store is open the table is created immediately. Switching is
    /// refused while a transaction is active.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Invalid`] for names that are not plain
    /// identifiers, [`PlainKvError::Transaction`] while a transaction is
    /// active, or engine errors when creating the table fails.
    pub fn set_table_name(&mut self, name: &str) -> Result<(), PlainKvError> {
        let table = TableName::new(name)?;
        if self.transaction.is_active() {
            return Err(PlainKvError::Transaction(
                "cannot switch table inside a transaction".to_string(),
            ));
        }
        let statements = Statements::for_table(&table);
        if self.connections.is_open() {
            let unit =
                UnitOfWork::acquire(&self.transaction, &self.connections, UnitKind::Statement)?;
            ensure_schema(unit.connection(), &statements)?;
            unit.finish()?;
        }
        tracing::debug!(table = table.as_str(), "plainkv table switched");
        self.config.table_name = table.as_str().to_string();
        self.table = table;
        self.statements = statements;
        Ok(())
    }

    /// Opens the pool if needed, runs `op` in a unit of work, then applies
    /// the auto-close policy.
    fn run<T, F>(&mut self, kind: UnitKind, op: F) -> Result<T, PlainKvError>
    where
        F: FnOnce(&Connection, &Statements) -> Result<T, PlainKvError>,
    {
        self.ensure_open()?;
        let result = (|| -> Result<T, PlainKvError> {
            let unit = UnitOfWork::acquire(&self.transaction, &self.connections, kind)?;
            let value = op(unit.connection(), &self.statements)?;
            unit.finish()?;
            Ok(value)
        })();
        self.release();
        result
    }

    /// Returns the unit kind for operations issuing several statements.
    const fn multi_statement_kind(&self) -> UnitKind {
        if self.config.atomic_operations { UnitKind::Atomic } else { UnitKind::Statement }
    }

    /// Returns the current bucket after rejecting the reserved mime bucket.
    fn data_bucket(&self) -> Result<String, PlainKvError> {
        check_data_bucket(&self.bucket)?;
        Ok(self.bucket.clone())
    }

    /// Opens the pool when closed.
    fn ensure_open(&mut self) -> Result<(), PlainKvError> {
        if self.connections.open(&self.config, &self.statements)? {
            tracing::debug!(table = self.table.as_str(), "plainkv store opened");
        }
        Ok(())
    }

    /// Validates a tally key, then adds `delta` to its counter.
    fn step_tally(&mut self, key: &str, delta: i64) -> Result<i64, PlainKvError> {
        let reserved = tally_key(key);
        validate_write(&self.bucket, &reserved, b"")?;
        let bucket = self.data_bucket()?;
        let kind = self.multi_statement_kind();
        self.run(kind, |connection, statements| {
            tally::step(connection, statements, &bucket, &reserved, delta)
        })
    }

    /// Drops the pool after a call when auto-close applies.
    fn release(&mut self) {
        if self.config.auto_close && !self.transaction.is_active() && self.connections.close() {
            tracing::debug!(table = self.table.as_str(), "plainkv store auto-closed");
        }
    }
}

impl PlainKv for SqlitePlainKv {
    fn open(&mut self) -> Result<(), PlainKvError> {
        self.ensure_open()
    }

    fn close(&mut self) -> Result<(), PlainKvError> {
        if self.transaction.discard() {
            tracing::warn!(table = self.table.as_str(), "active transaction discarded on close");
        }
        if self.connections.close() {
            tracing::debug!(table = self.table.as_str(), "plainkv store closed");
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), PlainKvError> {
        self.ensure_open()?;
        self.transaction.begin(&self.connections)?;
        tracing::debug!(table = self.table.as_str(), "transaction started");
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PlainKvError> {
        let result = self.transaction.commit();
        if matches!(result, Ok(true)) {
            tracing::debug!(table = self.table.as_str(), "transaction committed");
        }
        self.release();
        result.map(|_| ())
    }

    fn rollback(&mut self) -> Result<(), PlainKvError> {
        let result = self.transaction.rollback();
        if matches!(result, Ok(true)) {
            tracing::debug!(table = self.table.as_str(), "transaction rolled back");
        }
        self.release();
        result.map(|_| ())
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_active()
    }

    fn set_bucket(&mut self, bucket: &str) {
        self.bucket = normalize_bucket(bucket);
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn get(&mut self, key: &str) -> Result<Vec<u8>, PlainKvError> {
        let bucket = self.data_bucket()?;
        check_data_key(key)?;
        self.run(UnitKind::Statement, |connection, statements| {
            select_value(connection, statements, &bucket, key)
        })
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PlainKvError> {
        validate_write(&self.bucket, key, value)?;
        let bucket = self.data_bucket()?;
        check_data_key(key)?;
        self.run(UnitKind::Statement, |connection, statements| {
            upsert_value(connection, statements, &bucket, key, value)
        })
    }

    fn del(&mut self, key: &str) -> Result<(), PlainKvError> {
        let bucket = self.data_bucket()?;
        check_data_key(key)?;
        let kind = self.multi_statement_kind();
        self.run(kind, |connection, statements| {
            delete_value(connection, statements, &bucket, key)?;
            delete_value(connection, statements, MIME_BUCKET, key)
        })
    }

    fn get_mime(&mut self, key: &str) -> Result<String, PlainKvError> {
        check_data_key(key)?;
        let raw = self.run(UnitKind::Statement, |connection, statements| {
            select_value(connection, statements, MIME_BUCKET, key)
        })?;
        if raw.is_empty() {
            return Ok(DEFAULT_MIME.to_string());
        }
        String::from_utf8(raw)
            .map_err(|_| PlainKvError::Corrupt(format!("mime label for {key} is not utf-8")))
    }

    fn set_mime(&mut self, key: &str, mime: &str) -> Result<(), PlainKvError> {
        validate_write(MIME_BUCKET, key, mime.as_bytes())?;
        check_data_key(key)?;
        self.run(UnitKind::Statement, |connection, statements| {
            upsert_value(connection, statements, MIME_BUCKET, key, mime.as_bytes())
        })
    }

    fn list_keys(&mut self, pattern: &str) -> Result<Vec<String>, PlainKvError> {
        let bucket = self.data_bucket()?;
        self.run(UnitKind::Statement, |connection, statements| {
            select_keys(connection, statements, &bucket, pattern)
        })
    }

    fn tally(&mut self, key: &str, offset: i64) -> Result<i64, PlainKvError> {
        let reserved = tally_key(key);
        validate_write(&self.bucket, &reserved, b"")?;
        let bucket = self.data_bucket()?;
        let kind = self.multi_statement_kind();
        self.run(kind, |connection, statements| {
            tally::read_or_init(connection, statements, &bucket, &reserved, offset)
        })
    }

    fn tally_incr(&mut self, key: &str) -> Result<i64, PlainKvError> {
        self.step_tally(key, 1)
    }

    fn tally_decr(&mut self, key: &str) -> Result<i64, PlainKvError> {
        self.step_tally(key, -1)
    }

    fn tally_reset(&mut self, key: &str) -> Result<(), PlainKvError> {
        let reserved = tally_key(key);
        validate_write(&self.bucket, &reserved, b"")?;
        let bucket = self.data_bucket()?;
        self.run(UnitKind::Statement, |connection, statements| {
            tally::write(connection, statements, &bucket, &reserved, 0)
        })
    }
}

// ============================================================================
// SECTION: Record Statements
// ============================================================================

/// Reads one value; absent rows and NULL values read as empty.
pub(crate) fn select_value(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>, PlainKvError> {
    let mut statement = connection
        .prepare_cached(&statements.select_value)
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    let value = statement
        .query_row(params![bucket, key], |row| Ok(value_bytes(row.get_ref(0)?)))
        .optional()
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    Ok(value.unwrap_or_default())
}

/// Inserts or replaces one value.
pub(crate) fn upsert_value(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    key: &str,
    value: &[u8],
) -> Result<(), PlainKvError> {
    let mut statement = connection
        .prepare_cached(&statements.upsert_value)
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    statement
        .execute(params![bucket, key, value])
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    Ok(())
}

/// Deletes one record; deleting an absent record succeeds.
fn delete_value(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    key: &str,
) -> Result<(), PlainKvError> {
    let mut statement = connection
        .prepare_cached(&statements.delete_value)
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    statement.execute(params![bucket, key]).map_err(|err| PlainKvError::Db(err.to_string()))?;
    Ok(())
}

/// Lists data keys of `bucket` starting with `pattern`.
fn select_keys(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    pattern: &str,
) -> Result<Vec<String>, PlainKvError> {
    let mut statement = connection
        .prepare_cached(&statements.list_keys)
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![bucket, pattern, TALLY_PREFIX], |row| row.get::<_, String>(0))
        .map_err(|err| PlainKvError::Db(err.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|err| PlainKvError::Db(err.to_string()))
}

/// Converts a stored value of any storage class to bytes.
fn value_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Null => Vec::new(),
        ValueRef::Integer(number) => number.to_string().into_bytes(),
        ValueRef::Real(number) => number.to_string().into_bytes(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
    }
}
