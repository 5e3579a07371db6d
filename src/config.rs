//! Configuration for clipstash
//!
//! Centralized configuration with sensible defaults, an optional TOML file,
//! and a builder used by the command line layer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, StashError};
use crate::preview::Preview;

/// Directory name under the user's cache/config directories
pub const APP_DIR: &str = "clipstash";

/// Main configuration for a clipstash invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Data file of the history store
    ///   {cache_dir}/clipstash/
    ///     ├── db          (data file)
    ///     └── db.lock     (lock file)
    pub db_path: PathBuf,

    /// How long to wait for another invocation to release the store
    pub lock_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // History Configuration
    // -------------------------------------------------------------------------
    /// Entries kept after every store
    pub max_items: usize,

    /// Newest entries checked for an identical payload on store
    pub max_dedupe_search: usize,

    /// Payloads shorter than this are not stored
    pub min_store_length: usize,

    /// Payloads longer than this are not stored
    pub max_store_size: usize,

    // -------------------------------------------------------------------------
    // Output Configuration
    // -------------------------------------------------------------------------
    /// Characters of text shown per list line (0 = unlimited)
    pub preview_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            lock_timeout_ms: 1000,
            max_items: 750,
            max_dedupe_search: 100,
            min_store_length: 0,
            max_store_size: 5_000_000, // 5 MB
            preview_width: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Preview renderer for `list`
    pub fn preview(&self) -> Preview {
        Preview::new(self.preview_width)
    }
}

/// `<cache dir>/clipstash/db`, or `./clipstash/db` without a cache dir
pub fn default_db_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("db")
}

/// `<config dir>/clipstash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// On-disk config file; every key is optional
///
/// ```toml
/// max-items = 1000
/// preview-width = 80
/// db-path = "/tmp/clipstash.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigFile {
    pub db_path: Option<PathBuf>,
    pub lock_timeout_ms: Option<u64>,
    pub max_items: Option<usize>,
    pub max_dedupe_search: Option<usize>,
    pub min_store_length: Option<usize>,
    pub max_store_size: Option<usize>,
    pub preview_width: Option<usize>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StashError::Config(e.to_string()))
    }

    /// Load a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            StashError::Config(format!("reading {}: {}", path.display(), e))
        })?;
        Self::parse_at(&text, path)
    }

    /// Load a config file if it exists
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse_at(&text, path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StashError::Config(format!(
                "reading {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn parse_at(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| StashError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Take every value the file sets
    pub fn file(mut self, file: ConfigFile) -> Self {
        let c = &mut self.config;
        if let Some(v) = file.db_path {
            c.db_path = v;
        }
        if let Some(v) = file.lock_timeout_ms {
            c.lock_timeout_ms = v;
        }
        if let Some(v) = file.max_items {
            c.max_items = v;
        }
        if let Some(v) = file.max_dedupe_search {
            c.max_dedupe_search = v;
        }
        if let Some(v) = file.min_store_length {
            c.min_store_length = v;
        }
        if let Some(v) = file.max_store_size {
            c.max_store_size = v;
        }
        if let Some(v) = file.preview_width {
            c.preview_width = v;
        }
        self
    }

    /// Set the data file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the lock wait (in milliseconds)
    pub fn lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock_timeout_ms = ms;
        self
    }

    /// Set the maximum number of entries kept
    pub fn max_items(mut self, count: usize) -> Self {
        self.config.max_items = count;
        self
    }

    /// Set the dedup window
    pub fn max_dedupe_search(mut self, count: usize) -> Self {
        self.config.max_dedupe_search = count;
        self
    }

    pub fn min_store_length(mut self, len: usize) -> Self {
        self.config.min_store_length = len;
        self
    }

    pub fn max_store_size(mut self, size: usize) -> Self {
        self.config.max_store_size = size;
        self
    }

    pub fn preview_width(mut self, width: usize) -> Self {
        self.config.preview_width = width;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
