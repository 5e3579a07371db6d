//! Tests for configuration loading and precedence

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use clipstash::cli::{resolve_config, Args, Command};
use clipstash::config::{default_db_path, ConfigFile};
use clipstash::{Config, StashError};
use tempfile::TempDir;

fn write_config(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, text).unwrap();
    path
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.max_items, 750);
    assert_eq!(config.max_dedupe_search, 100);
    assert_eq!(config.min_store_length, 0);
    assert_eq!(config.max_store_size, 5_000_000);
    assert_eq!(config.preview_width, 100);
    assert_eq!(config.lock_timeout_ms, 1000);
    assert_eq!(config.db_path, default_db_path());
    assert!(config.db_path.ends_with("clipstash/db"));
}

// =============================================================================
// Config File Tests
// =============================================================================

#[test]
fn test_parse_config_file() {
    let file = ConfigFile::parse(
        r#"
        max-items = 10
        max-dedupe-search = 3
        preview-width = 0
        db-path = "/tmp/elsewhere"
        "#,
    )
    .unwrap();

    assert_eq!(file.max_items, Some(10));
    assert_eq!(file.max_dedupe_search, Some(3));
    assert_eq!(file.preview_width, Some(0));
    assert_eq!(file.db_path, Some(PathBuf::from("/tmp/elsewhere")));
    assert_eq!(file.min_store_length, None);
}

#[test]
fn test_empty_config_file() {
    assert_eq!(ConfigFile::parse("").unwrap(), ConfigFile::default());
}

#[test]
fn test_unknown_key_rejected() {
    let result = ConfigFile::parse("max_items = 10");

    assert!(matches!(result, Err(StashError::Config(_))));
}

#[test]
fn test_wrong_type_rejected() {
    let result = ConfigFile::parse("max-items = \"many\"");

    assert!(matches!(result, Err(StashError::Config(_))));
}

#[test]
fn test_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");

    assert!(matches!(
        ConfigFile::load(&path),
        Err(StashError::Config(_))
    ));
    assert_eq!(ConfigFile::load_optional(&path).unwrap(), None);
}

#[test]
fn test_load_error_names_file() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "bogus = 1");

    let message = ConfigFile::load(&path).unwrap_err().to_string();

    assert!(message.contains("config.toml"), "{}", message);
}

// =============================================================================
// Builder / Precedence Tests
// =============================================================================

#[test]
fn test_builder_file_then_override() {
    let file = ConfigFile {
        max_items: Some(10),
        preview_width: Some(40),
        ..ConfigFile::default()
    };

    let config = Config::builder().file(file).max_items(20).build();

    assert_eq!(config.max_items, 20);
    assert_eq!(config.preview_width, 40);
    assert_eq!(config.max_dedupe_search, 100);
}

#[test]
fn test_resolve_flags_over_file() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "max-items = 10\npreview-width = 40\n");

    let args = Args::try_parse_from([
        "clipstash",
        "--config-path",
        config_path.to_str().unwrap(),
        "--max-items",
        "5",
        "list",
    ])
    .unwrap();
    let config = resolve_config(&args).unwrap();

    assert_eq!(config.max_items, 5);
    assert_eq!(config.preview_width, 40);
}

#[test]
fn test_resolve_missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.toml");

    let args = Args::try_parse_from([
        "clipstash",
        "--config-path",
        missing.to_str().unwrap(),
        "list",
    ])
    .unwrap();

    assert!(matches!(resolve_config(&args), Err(StashError::Config(_))));
}

// =============================================================================
// Argument Parsing Tests
// =============================================================================

#[test]
fn test_parse_subcommands() {
    let parse = |argv: &[&str]| Args::try_parse_from(argv).unwrap().command;

    assert_eq!(parse(&["clipstash", "store"]), Command::Store);
    assert_eq!(parse(&["clipstash", "list"]), Command::List);
    assert_eq!(parse(&["clipstash", "delete"]), Command::Delete);
    assert_eq!(parse(&["clipstash", "wipe"]), Command::Wipe);
    assert_eq!(parse(&["clipstash", "version"]), Command::Version);
    assert_eq!(
        parse(&["clipstash", "decode"]),
        Command::Decode { reference: None }
    );
    assert_eq!(
        parse(&["clipstash", "decode", "3\tsomething"]),
        Command::Decode {
            reference: Some("3\tsomething".to_string())
        }
    );
    assert_eq!(
        parse(&["clipstash", "delete-query", "secret"]),
        Command::DeleteQuery {
            query: OsString::from("secret")
        }
    );
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = Args::try_parse_from(["clipstash", "list", "--preview-width", "0"]).unwrap();

    assert_eq!(args.preview_width, Some(0));
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Args::try_parse_from(["clipstash", "explode"]).is_err());
    assert!(Args::try_parse_from(["clipstash"]).is_err());
}
