// crates/plainkv-core/src/lib.rs
// ============================================================================
// Module: PlainKV Core Library
// Description: Public API surface for the PlainKV key-value contract.
// Purpose: Expose errors, validation rules, key namespaces, and interfaces.
// Dependencies: crate::{error, record, keyspace, interfaces, memory}
// ============================================================================

//! ## Overview
//! PlainKV core defines the bucket-scoped key-value contract shared by every
//! backend: sentinel errors, write-time size limits, the reserved mime and
//! tally namespaces, and the [`PlainKv`] interface. It is backend-agnostic;
//! durable implementations live in separate crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod interfaces;
pub mod keyspace;
pub mod memory;
pub mod record;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::PlainKvError;
pub use interfaces::PlainKv;
pub use keyspace::DEFAULT_MIME;
pub use keyspace::MIME_BUCKET;
pub use keyspace::TALLY_PREFIX;
pub use memory::InMemoryPlainKv;
pub use record::DEFAULT_BUCKET;
pub use record::MAX_BUCKET_BYTES;
pub use record::MAX_KEY_BYTES;
pub use record::MAX_VALUE_BYTES;
