// crates/plainkv-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Key-Value Configuration
// Description: Store configuration, defaults, and TOML loading.
// Purpose: Provide strict, fail-closed configuration with pool limits.
// Dependencies: plainkv-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! [`SqlitePlainKvConfig`] carries the connection descriptor, pool limits, and
//! store policy. It can be built in code via [`SqlitePlainKvConfig::new`] or
//! loaded from a TOML file with size and encoding limits. Invalid
//! configuration is rejected before any connection is attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use plainkv_core::MAX_BUCKET_BYTES;
use plainkv_core::MIME_BUCKET;
use plainkv_core::PlainKvError;
use plainkv_core::record::DEFAULT_BUCKET;
use serde::Deserialize;
use thiserror::Error;

use crate::descriptor::ConnectionDescriptor;
use crate::schema::DEFAULT_TABLE_NAME;
use crate::schema::TableName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default maximum number of pooled connections.
const DEFAULT_MAX_OPEN_CONNECTIONS: u32 = 10;
/// Default number of idle connections kept warm.
const DEFAULT_MIN_IDLE_CONNECTIONS: u32 = 1;
/// Default pooled connection lifetime (ms).
const DEFAULT_CONNECTION_MAX_LIFETIME_MS: u64 = 3 * 60 * 1_000;
/// Default pool checkout timeout (ms).
const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 5_000;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("plainkv config io error: {0}")]
    Io(String),
    /// Config file is not valid TOML for this schema.
    #[error("plainkv config parse error: {0}")]
    Parse(String),
    /// Config values are out of range or inconsistent.
    #[error("plainkv config invalid: {0}")]
    Invalid(String),
}

impl From<ConfigError> for PlainKvError {
    fn from(error: ConfigError) -> Self {
        Self::Invalid(error.to_string())
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` key-value store.
///
/// # Invariants
/// - `dsn` parses as a [`ConnectionDescriptor`].
/// - `max_open_connections` is greater than zero and at least
///   `min_idle_connections`.
/// - Durations are interpreted as milliseconds and are greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqlitePlainKvConfig {
    /// Connection descriptor (`path[?_pragma=name(value)&...]`).
    pub dsn: String,
    /// Release the pool after every operation outside a transaction.
    #[serde(default)]
    pub auto_close: bool,
    /// Table holding all records.
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Initial bucket.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Maximum pooled connections.
    #[serde(default = "default_max_open_connections")]
    pub max_open_connections: u32,
    /// Idle connections kept open by the pool.
    #[serde(default = "default_min_idle_connections")]
    pub min_idle_connections: u32,
    /// Maximum lifetime of a pooled connection in milliseconds.
    #[serde(default = "default_connection_max_lifetime_ms")]
    pub connection_max_lifetime_ms: u64,
    /// Maximum wait for a pooled connection in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Run multi-statement operations atomically outside explicit transactions.
    #[serde(default = "default_atomic_operations")]
    pub atomic_operations: bool,
}

/// Returns the default table name.
fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

/// Returns the default bucket.
fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

/// Returns the default maximum pooled connections.
const fn default_max_open_connections() -> u32 {
    DEFAULT_MAX_OPEN_CONNECTIONS
}

/// Returns the default idle connection count.
const fn default_min_idle_connections() -> u32 {
    DEFAULT_MIN_IDLE_CONNECTIONS
}

/// Returns the default connection lifetime.
const fn default_connection_max_lifetime_ms() -> u64 {
    DEFAULT_CONNECTION_MAX_LIFETIME_MS
}

/// Returns the default checkout timeout.
const fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default atomic-operations policy.
const fn default_atomic_operations() -> bool {
    true
}

impl SqlitePlainKvConfig {
    /// Creates a configuration with default limits for `dsn`.
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            auto_close: false,
            table_name: default_table_name(),
            bucket: default_bucket(),
            max_open_connections: DEFAULT_MAX_OPEN_CONNECTIONS,
            min_idle_connections: DEFAULT_MIN_IDLE_CONNECTIONS,
            connection_max_lifetime_ms: DEFAULT_CONNECTION_MAX_LIFETIME_MS,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            atomic_operations: true,
        }
    }

    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConnectionDescriptor::parse(&self.dsn)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        TableName::new(&self.table_name).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if self.bucket.len() > MAX_BUCKET_BYTES {
            return Err(ConfigError::Invalid(format!(
                "bucket exceeds {MAX_BUCKET_BYTES} bytes"
            )));
        }
        if self.bucket == MIME_BUCKET {
            return Err(ConfigError::Invalid("bucket is reserved for mime metadata".to_string()));
        }
        if self.max_open_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_open_connections must be greater than zero".to_string(),
            ));
        }
        if self.min_idle_connections > self.max_open_connections {
            return Err(ConfigError::Invalid(
                "min_idle_connections must not exceed max_open_connections".to_string(),
            ));
        }
        if self.connection_max_lifetime_ms == 0 {
            return Err(ConfigError::Invalid(
                "connection_max_lifetime_ms must be greater than zero".to_string(),
            ));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connection_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
