// crates/plainkv-store-sqlite/tests/config_descriptor.rs
// ============================================================================
// Module: Configuration and Descriptor Tests
// Description: Validate TOML configuration and connection descriptor parsing.
// Purpose: Ensure invalid settings fail closed before any connection opens.
// Dependencies: plainkv-store-sqlite, proptest, tempfile
// ============================================================================

//! ## Overview
//! Config defaults, range validation, file loading limits, and descriptor
//! parsing, including a property check that only allow-listed pragma text is
//! ever accepted for interpolation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use plainkv_store_sqlite::ConfigError;
use plainkv_store_sqlite::ConnectionDescriptor;
use plainkv_store_sqlite::DEFAULT_TABLE_NAME;
use plainkv_store_sqlite::PlainKvError;
use plainkv_store_sqlite::SqlitePlainKv;
use plainkv_store_sqlite::SqlitePlainKvConfig;
use plainkv_store_sqlite::TableName;
use plainkv_store_sqlite::TxLock;
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// SECTION: Configuration
// ============================================================================

#[test]
fn config_minimal_toml_uses_defaults() {
    let config = SqlitePlainKvConfig::from_toml_str("dsn = \"data/kv.db\"").unwrap();
    assert_eq!(config, SqlitePlainKvConfig::new("data/kv.db"));
    assert!(!config.auto_close);
    assert!(config.atomic_operations);
    assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
    assert_eq!(config.bucket, "default");
    assert_eq!(config.max_open_connections, 10);
    assert_eq!(config.connection_max_lifetime_ms, 180_000);
}

#[test]
fn config_full_toml_parses() {
    let config = SqlitePlainKvConfig::from_toml_str(
        r#"
        dsn = "kv.db?_pragma=journal_mode(WAL)&_txlock=immediate"
        auto_close = true
        table_name = "Pages"
        bucket = "site"
        max_open_connections = 4
        min_idle_connections = 0
        connection_max_lifetime_ms = 60000
        connection_timeout_ms = 1000
        busy_timeout_ms = 250
        atomic_operations = false
        "#,
    )
    .unwrap();
    assert!(config.auto_close);
    assert!(!config.atomic_operations);
    assert_eq!(config.table_name, "Pages");
    assert_eq!(config.max_open_connections, 4);
    assert_eq!(config.busy_timeout_ms, 250);
}

#[test]
fn config_rejects_invalid_values() {
    let cases = [
        "dsn = \"\"",
        "dsn = \"kv.db?_journal=wal\"",
        "dsn = \"kv.db\"\ntable_name = \"bad name\"",
        "dsn = \"kv.db\"\nbucket = \"--mime--\"",
        "dsn = \"kv.db\"\nmax_open_connections = 0",
        "dsn = \"kv.db\"\nmax_open_connections = 2\nmin_idle_connections = 3",
        "dsn = \"kv.db\"\nconnection_timeout_ms = 0",
        "dsn = \"kv.db\"\nbusy_timeout_ms = 0",
    ];
    for case in cases {
        assert!(
            matches!(SqlitePlainKvConfig::from_toml_str(case), Err(ConfigError::Invalid(_))),
            "{case}"
        );
    }
    let long_bucket = format!("dsn = \"kv.db\"\nbucket = \"{}\"", "b".repeat(51));
    assert!(matches!(
        SqlitePlainKvConfig::from_toml_str(&long_bucket),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn config_rejects_malformed_toml() {
    assert!(matches!(
        SqlitePlainKvConfig::from_toml_str("max_open_connections = 3"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        SqlitePlainKvConfig::from_toml_str("dsn = "),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn config_load_reads_file_with_limits() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("plainkv.toml");
    fs::write(&path, "dsn = \"kv.db\"\nbucket = \"site\"\n").unwrap();
    assert_eq!(SqlitePlainKvConfig::load(&path).unwrap().bucket, "site");

    let oversized = temp.path().join("oversized.toml");
    fs::write(&oversized, "#".repeat(1024 * 1024 + 1)).unwrap();
    assert!(matches!(SqlitePlainKvConfig::load(&oversized), Err(ConfigError::Invalid(_))));

    let binary = temp.path().join("binary.toml");
    fs::write(&binary, [0xff_u8, 0xfe, 0x00]).unwrap();
    assert!(matches!(SqlitePlainKvConfig::load(&binary), Err(ConfigError::Invalid(_))));

    assert!(matches!(
        SqlitePlainKvConfig::load(Path::new("/nonexistent/plainkv.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn store_with_invalid_config_rejected() {
    let mut config = SqlitePlainKvConfig::new("kv.db");
    config.max_open_connections = 0;
    assert!(matches!(SqlitePlainKv::with_config(config), Err(PlainKvError::Invalid(_))));
}

#[test]
fn table_name_allow_list() {
    assert_eq!(TableName::new("KeyValueTBL").unwrap().as_str(), "KeyValueTBL");
    assert!(TableName::new("_private1").is_ok());
    assert!(TableName::new(&"t".repeat(64)).is_ok());
    assert!(TableName::new(&"t".repeat(65)).is_err());
    assert!(TableName::new("table-name").is_err());
    assert!(TableName::new("sqlite_sequence").is_err());
}

// ============================================================================
// SECTION: Descriptor
// ============================================================================

#[test]
fn descriptor_plain_path() {
    let descriptor = ConnectionDescriptor::parse("data/kv.db").unwrap();
    assert_eq!(descriptor.path(), Path::new("data/kv.db"));
    assert!(descriptor.pragmas().is_empty());
    assert_eq!(descriptor.tx_lock(), TxLock::Deferred);
    assert!(!descriptor.in_memory());
}

#[test]
fn descriptor_pragmas_and_lock_mode() {
    let descriptor = ConnectionDescriptor::parse(
        "file:kv.db?_pragma=journal_mode(WAL)&_pragma=synchronous%3DNORMAL&_txlock=Exclusive",
    )
    .unwrap();
    assert_eq!(descriptor.path(), Path::new("kv.db"));
    let pragmas: Vec<_> =
        descriptor.pragmas().iter().map(|pragma| (pragma.name(), pragma.value())).collect();
    assert_eq!(pragmas, vec![("journal_mode", "WAL"), ("synchronous", "NORMAL")]);
    assert_eq!(descriptor.pragmas()[0].statement(), "PRAGMA journal_mode = WAL;");
    assert_eq!(descriptor.tx_lock(), TxLock::Exclusive);
    assert_eq!(descriptor.tx_lock().begin_sql(), "BEGIN EXCLUSIVE");
}

#[test]
fn descriptor_memory_location() {
    assert!(ConnectionDescriptor::parse(":memory:").unwrap().in_memory());
    assert!(ConnectionDescriptor::parse("file::memory:").unwrap().in_memory());
}

#[test]
fn descriptor_rejects_malformed_input() {
    let cases = [
        "",
        "?_pragma=foreign_keys(1)",
        "kv.db?_pragma=journal_mode(WAL",
        "kv.db?_pragma=foreign_keys",
        "kv.db?_pragma=journal_mode(WAL);DROP",
        "kv.db?_pragma=1bad(1)",
        "kv.db?_txlock=sometimes",
        "kv.db?cache=shared",
    ];
    for case in cases {
        assert!(
            matches!(ConnectionDescriptor::parse(case), Err(PlainKvError::Connection(_))),
            "{case}"
        );
    }
}

proptest! {
    #[test]
    fn descriptor_accepts_only_allow_listed_pragma_text(name in ".{0,12}", value in ".{0,12}") {
        let dsn = format!(
            "kv.db?_pragma={}",
            url::form_urlencoded::byte_serialize(format!("{name}({value})").as_bytes())
                .collect::<String>()
        );
        if let Ok(descriptor) = ConnectionDescriptor::parse(&dsn) {
            let pragma = &descriptor.pragmas()[0];
            let name_ok =
                pragma.name().chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
            let value_ok = pragma
                .value()
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
            prop_assert!(name_ok, "name {:?}", pragma.name());
            prop_assert!(value_ok, "value {:?}", pragma.value());
            prop_assert_eq!(pragma.statement().matches(';').count(), 1);
        }
    }
}
