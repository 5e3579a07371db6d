//! Command line surface
//!
//! Argument parsing, configuration resolution and dispatch of one command
//! per invocation.
//!
//! ## Configuration Precedence
//! flag > `CLIPSTASH_*` environment variable > config file > default

mod dispatch;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{self, Config, ConfigFile};
use crate::error::Result;

pub use dispatch::{
    decode, delete, delete_query, dispatch, list, store, version, wipe, ClipboardState,
    CLIPBOARD_STATE_VAR,
};

/// clipstash CLI
#[derive(Parser, Debug)]
#[command(name = "clipstash")]
#[command(about = "Clipboard history with deduplication and bounded size")]
#[command(version)]
pub struct Args {
    /// Data file of the history store
    #[arg(long, env = "CLIPSTASH_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// TOML config file (default: <config dir>/clipstash/config.toml)
    #[arg(long, env = "CLIPSTASH_CONFIG_PATH", global = true)]
    pub config_path: Option<PathBuf>,

    /// Entries kept after every store
    #[arg(long, env = "CLIPSTASH_MAX_ITEMS", global = true)]
    pub max_items: Option<usize>,

    /// Newest entries searched for a duplicate on store (0 disables)
    #[arg(long, env = "CLIPSTASH_MAX_DEDUPE_SEARCH", global = true)]
    pub max_dedupe_search: Option<usize>,

    /// Minimum payload length to store
    #[arg(long, env = "CLIPSTASH_MIN_STORE_LENGTH", global = true)]
    pub min_store_length: Option<usize>,

    /// Payloads above this many bytes are ignored
    #[arg(long, env = "CLIPSTASH_MAX_STORE_SIZE", global = true)]
    pub max_store_size: Option<usize>,

    /// Characters of text per list line (0 = unlimited)
    #[arg(long, env = "CLIPSTASH_PREVIEW_WIDTH", global = true)]
    pub preview_width: Option<usize>,

    /// Milliseconds to wait for the store lock
    #[arg(long, env = "CLIPSTASH_LOCK_TIMEOUT_MS", global = true)]
    pub lock_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store stdin as the newest entry
    Store,

    /// Print entries newest first as "<id>\t<preview>"
    List,

    /// Print the exact payload of a reference line
    Decode {
        /// Reference line; read from stdin when absent
        reference: Option<String>,
    },

    /// Delete the entries referenced by the lines on stdin
    Delete,

    /// Delete entries whose payload contains a substring
    DeleteQuery {
        /// Raw substring to look for; need not be valid UTF-8
        #[arg(value_parser = clap::value_parser!(OsString))]
        query: OsString,
    },

    /// Delete every entry
    Wipe,

    /// Print the version
    Version,
}

/// Build the effective config for `args`
///
/// An explicit `--config-path` must exist; the default config file is
/// optional.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let file = match &args.config_path {
        Some(path) => Some(ConfigFile::load(path)?),
        None => match config::default_config_path() {
            Some(path) => ConfigFile::load_optional(&path)?,
            None => None,
        },
    };

    let mut builder = Config::builder();
    if let Some(file) = file {
        builder = builder.file(file);
    }
    if let Some(path) = &args.db_path {
        builder = builder.db_path(path);
    }
    if let Some(v) = args.max_items {
        builder = builder.max_items(v);
    }
    if let Some(v) = args.max_dedupe_search {
        builder = builder.max_dedupe_search(v);
    }
    if let Some(v) = args.min_store_length {
        builder = builder.min_store_length(v);
    }
    if let Some(v) = args.max_store_size {
        builder = builder.max_store_size(v);
    }
    if let Some(v) = args.preview_width {
        builder = builder.preview_width(v);
    }
    if let Some(v) = args.lock_timeout_ms {
        builder = builder.lock_timeout_ms(v);
    }
    Ok(builder.build())
}
