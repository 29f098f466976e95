// crates/plainkv-store-sqlite/src/tally.rs
// ============================================================================
// Module: SQLite Tally Counters
// Description: Read-modify-write helpers for decimal tally records.
// Purpose: Keep counter statements on the caller's unit of work.
// Dependencies: plainkv-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! A tally is the decimal string stored at `(bucket, TALLY_PREFIX + key)`.
//! These helpers run on a connection the store has already placed inside a
//! unit of work; whether the read and write commit together is decided there.
//! Values that do not decode read as zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use plainkv_core::PlainKvError;
use plainkv_core::keyspace::decode_tally;
use plainkv_core::keyspace::encode_tally;
use plainkv_core::keyspace::step_tally;
use rusqlite::Connection;

use crate::schema::Statements;
use crate::store::select_value;
use crate::store::upsert_value;

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Returns the tally at `reserved`, first storing `offset` when none exists.
pub(crate) fn read_or_init(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    reserved: &str,
    offset: i64,
) -> Result<i64, PlainKvError> {
    let raw = select_value(connection, statements, bucket, reserved)?;
    if raw.is_empty() {
        write(connection, statements, bucket, reserved, offset)?;
        return Ok(offset);
    }
    Ok(decode(bucket, reserved, &raw))
}

/// Adds `delta` to the tally at `reserved` and returns the new value.
pub(crate) fn step(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    reserved: &str,
    delta: i64,
) -> Result<i64, PlainKvError> {
    let current = read_or_init(connection, statements, bucket, reserved, 0)?;
    let next = step_tally(current, delta)?;
    write(connection, statements, bucket, reserved, next)?;
    Ok(next)
}

/// Stores `value` as the tally at `reserved`.
pub(crate) fn write(
    connection: &Connection,
    statements: &Statements,
    bucket: &str,
    reserved: &str,
    value: i64,
) -> Result<(), PlainKvError> {
    upsert_value(connection, statements, bucket, reserved, &encode_tally(value))
}

/// Decodes a stored tally, reading corrupt values as zero.
fn decode(bucket: &str, reserved: &str, raw: &[u8]) -> i64 {
    decode_tally(raw).unwrap_or_else(|| {
        tracing::warn!(bucket, key = reserved, "corrupt tally value read as zero");
        0
    })
}
