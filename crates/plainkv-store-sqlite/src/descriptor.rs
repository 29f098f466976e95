// crates/plainkv-store-sqlite/src/descriptor.rs
// ============================================================================
// Module: SQLite Connection Descriptor
// Description: Parses path-like connection strings with pragma parameters.
// Purpose: Turn `path?_pragma=name(value)` descriptors into validated settings.
// Dependencies: plainkv-core, url
// ============================================================================

//! ## Overview
//! A descriptor names the database file and optionally carries engine settings
//! as query parameters:
//!
//! ```text
//! data/kv.db?_pragma=journal_mode(WAL)&_pragma=busy_timeout(5000)&_txlock=immediate
//! ```
//!
//! - `_pragma=name(value)` (or `name=value`) is applied to every pooled
//!   connection, in order.
//! - `_txlock` selects the `BEGIN` mode of explicit transactions.
//! - `:memory:` opens a private in-memory database; a `file:` prefix is
//!   accepted and stripped.
//!
//! Pragma names and values are interpolated into SQL, so both are restricted
//! to an allow-list of characters. Unknown parameters fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use plainkv_core::PlainKvError;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Location naming a private in-memory database.
const MEMORY_LOCATION: &str = ":memory:";
/// Maximum length of a pragma name.
const MAX_PRAGMA_NAME_LENGTH: usize = 64;
/// Maximum length of a pragma value.
const MAX_PRAGMA_VALUE_LENGTH: usize = 64;

// ============================================================================
// SECTION: Transaction Lock Mode
// ============================================================================

/// Locking mode used when an explicit transaction begins.
///
/// # Invariants
/// - Variants map 1:1 to `SQLite` `BEGIN` statement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxLock {
    /// Acquire locks lazily on first read or write (engine default).
    #[default]
    Deferred,
    /// Acquire the write lock when the transaction begins.
    Immediate,
    /// Acquire an exclusive lock when the transaction begins.
    Exclusive,
}

impl TxLock {
    /// Returns the `BEGIN` statement for this mode.
    #[must_use]
    pub const fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED",
            Self::Immediate => "BEGIN IMMEDIATE",
            Self::Exclusive => "BEGIN EXCLUSIVE",
        }
    }

    /// Parses a `_txlock` parameter value.
    fn parse(raw: &str) -> Result<Self, PlainKvError> {
        match raw.to_ascii_lowercase().as_str() {
            "deferred" => Ok(Self::Deferred),
            "immediate" => Ok(Self::Immediate),
            "exclusive" => Ok(Self::Exclusive),
            _ => Err(malformed(&format!("unsupported _txlock mode: {raw}"))),
        }
    }
}

// ============================================================================
// SECTION: Pragmas
// ============================================================================

/// A validated engine pragma carried by the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pragma {
    /// Pragma name.
    name: String,
    /// Pragma value.
    value: String,
}

impl Pragma {
    /// Parses `name(value)` or `name=value`.
    fn parse(raw: &str) -> Result<Self, PlainKvError> {
        let (name, value) = if let Some(open) = raw.find('(') {
            let Some(inner) = raw[open + 1..].strip_suffix(')') else {
                return Err(malformed(&format!("unbalanced pragma: {raw}")));
            };
            (&raw[..open], inner)
        } else if let Some((name, value)) = raw.split_once('=') {
            (name, value)
        } else {
            return Err(malformed(&format!("pragma without value: {raw}")));
        };
        let name = name.trim();
        let value = value.trim();
        if !is_pragma_name(name) {
            return Err(malformed(&format!("invalid pragma name: {name}")));
        }
        if !is_pragma_value(value) {
            return Err(malformed(&format!("invalid value for pragma {name}")));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Returns the pragma name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pragma value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the statement applying this pragma.
    #[must_use]
    pub fn statement(&self) -> String {
        format!("PRAGMA {} = {};", self.name, self.value)
    }
}

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// Parsed connection descriptor.
///
/// # Invariants
/// - `path` is non-empty.
/// - Every pragma passed the name and value allow-lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Database file path, or `:memory:`.
    path: PathBuf,
    /// Pragmas applied to each connection, in order.
    pragmas: Vec<Pragma>,
    /// `BEGIN` mode for explicit transactions.
    tx_lock: TxLock,
}

impl ConnectionDescriptor {
    /// Parses a descriptor string.
    ///
    /// # Errors
    ///
    /// Returns [`PlainKvError::Connection`] when the descriptor is malformed.
    pub fn parse(dsn: &str) -> Result<Self, PlainKvError> {
        let (location, query) = match dsn.split_once('?') {
            Some((location, query)) => (location, query),
            None => (dsn, ""),
        };
        let location = location.strip_prefix("file:").unwrap_or(location).trim();
        if location.is_empty() {
            return Err(malformed("missing database path"));
        }
        let mut pragmas = Vec::new();
        let mut tx_lock = TxLock::default();
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "_pragma" => pragmas.push(Pragma::parse(&value)?),
                "_txlock" => tx_lock = TxLock::parse(&value)?,
                other => return Err(malformed(&format!("unknown parameter: {other}"))),
            }
        }
        Ok(Self {
            path: PathBuf::from(location),
            pragmas,
            tx_lock,
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true for a private in-memory database.
    #[must_use]
    pub fn in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_LOCATION
    }

    /// Returns the pragmas in application order.
    #[must_use]
    pub fn pragmas(&self) -> &[Pragma] {
        &self.pragmas
    }

    /// Returns the explicit transaction lock mode.
    #[must_use]
    pub const fn tx_lock(&self) -> TxLock {
        self.tx_lock
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a malformed-descriptor error.
fn malformed(detail: &str) -> PlainKvError {
    PlainKvError::Connection(format!("malformed connection descriptor: {detail}"))
}

/// Returns true when `name` is a plain identifier.
fn is_pragma_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_PRAGMA_NAME_LENGTH
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Returns true when `value` is a bare word or number.
fn is_pragma_value(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_PRAGMA_VALUE_LENGTH
        && value.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}
