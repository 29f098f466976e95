// crates/plainkv-store-sqlite/src/lib.rs
// ============================================================================
// Module: PlainKV SQLite Store Library
// Description: SQLite-backed PlainKv implementation.
// Purpose: Persist bucket records in one pooled SQLite table.
// Dependencies: plainkv-core, r2d2, rusqlite, serde, thiserror, toml, tracing, url
// ============================================================================

//! ## Overview
//! This crate provides [`SqlitePlainKv`], a durable [`PlainKv`] backed by a
//! single `SQLite` table keyed by `(Bucket, KeyID)`. Connections come from an
//! r2d2 pool opened on first use. Operations run either inside the caller's
//! explicit transaction or in an implicit unit of work; multi-statement
//! operations are atomic by default.
//!
//! The connection descriptor is a database path with optional
//! `_pragma=name(value)` and `_txlock=deferred|immediate|exclusive` query
//! parameters, e.g. `data.db?_pragma=journal_mode(WAL)&_txlock=immediate`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
mod connection;
pub mod descriptor;
pub mod schema;
pub mod store;
mod tally;
mod unit;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::SqlitePlainKvConfig;
pub use descriptor::ConnectionDescriptor;
pub use descriptor::Pragma;
pub use descriptor::TxLock;
pub use plainkv_core::PlainKv;
pub use plainkv_core::PlainKvError;
pub use schema::DEFAULT_TABLE_NAME;
pub use schema::TableName;
pub use store::SqlitePlainKv;
