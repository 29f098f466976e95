// crates/plainkv-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Key-Value Schema
// Description: Table naming rules and the parameterized statement set.
// Purpose: Keep the only interpolated identifier behind an allow-list.
// Dependencies: plainkv-core
// ============================================================================

//! ## Overview
//! All records live in one table keyed by `(Bucket, KeyID)`. The table name is
//! configurable and therefore interpolated into SQL; [`TableName`] restricts it
//! to a plain identifier. Every other input is a bound parameter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use plainkv_core::PlainKvError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Table used when no name is configured.
pub const DEFAULT_TABLE_NAME: &str = "KeyValueTBL";
/// Maximum table name length.
const MAX_TABLE_NAME_LENGTH: usize = 64;
/// Prefix `SQLite` reserves for internal tables.
const SQLITE_INTERNAL_PREFIX: &str = "sqlite_";

// ============================================================================
// SECTION: Table Name
// ============================================================================

/// Validated table identifier.
///
/// # Invariants
/// - Matches `[A-Za-z_][A-Za-z0-9_]{0,63}`.
/// - Never starts with the engine-reserved `sqlite_` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Validates a table name.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Invalid`] when the name is not a plain identifier.
    pub fn new(name: &str) -> Result<Self, PlainKvError> {
        let mut chars = name.chars();
        let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
        if !valid_start
            || name.len() > MAX_TABLE_NAME_LENGTH
            || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return Err(PlainKvError::Invalid(format!("invalid table name: {name:?}")));
        }
        if name.to_ascii_lowercase().starts_with(SQLITE_INTERNAL_PREFIX) {
            return Err(PlainKvError::Invalid(format!("reserved table name: {name}")));
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// SQL statements bound to one table.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    /// Idempotent table creation.
    pub(crate) create_table: String,
    /// Reads one value: `?1` bucket, `?2` key.
    pub(crate) select_value: String,
    /// Inserts or replaces one value: `?1` bucket, `?2` key, `?3` value.
    pub(crate) upsert_value: String,
    /// Deletes one record: `?1` bucket, `?2` key.
    pub(crate) delete_value: String,
    /// Lists keys: `?1` bucket, `?2` literal prefix, `?3` excluded prefix.
    /// Prefixes compare as bytes so `NUL` and wildcard characters match literally.
    pub(crate) list_keys: String,
}

impl Statements {
    /// Builds the statement set for `table`.
    pub(crate) fn for_table(table: &TableName) -> Self {
        let table = table.as_str();
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    Bucket VARCHAR(50),
                    KeyID VARCHAR(300),
                    Value MEDIUMBLOB,
                    PRIMARY KEY (Bucket, KeyID)
                );"
            ),
            select_value: format!("SELECT Value FROM {table} WHERE Bucket = ?1 AND KeyID = ?2"),
            upsert_value: format!(
                "INSERT INTO {table} (Bucket, KeyID, Value) VALUES (?1, ?2, ?3) ON \
                 CONFLICT(Bucket, KeyID) DO UPDATE SET Value = excluded.Value"
            ),
            delete_value: format!("DELETE FROM {table} WHERE Bucket = ?1 AND KeyID = ?2"),
            list_keys: format!(
                "SELECT KeyID FROM {table} WHERE Bucket = ?1 \
                 AND substr(CAST(KeyID AS BLOB), 1, length(CAST(?2 AS BLOB))) = CAST(?2 AS BLOB) \
                 AND substr(CAST(KeyID AS BLOB), 1, length(CAST(?3 AS BLOB))) <> CAST(?3 AS BLOB)"
            ),
        }
    }
}
