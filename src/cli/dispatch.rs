//! Command handlers
//!
//! Each handler opens the history in the mode it needs, performs one
//! operation and returns. Stdin/stdout are passed in so the handlers can be
//! driven from tests.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StashError};
use crate::history::{Access, History};

use super::Command;

/// Environment variable set by clipboard watchers (e.g. `wl-paste --watch`)
pub const CLIPBOARD_STATE_VAR: &str = "CLIPBOARD_STATE";

/// What the clipboard watcher says about the current content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipboardState {
    /// Ordinary content; store it
    #[default]
    Data,
    /// Marked sensitive (passwords); never store
    Sensitive,
    /// The clipboard was cleared; forget the newest entry
    Clear,
}

impl ClipboardState {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("sensitive") => ClipboardState::Sensitive,
            Some("clear") => ClipboardState::Clear,
            _ => ClipboardState::Data,
        }
    }
}

/// Run `command`
pub fn dispatch(
    command: &Command,
    config: &Config,
    clipboard_state: ClipboardState,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<()> {
    debug!(target: "clipstash::cli", ?command, db = %config.db_path.display(), "dispatching");

    match command {
        Command::Store => store(config, clipboard_state, stdin).map(|_| ()),
        Command::List => list(config, stdout).map(|_| ()),
        Command::Decode { reference } => decode(config, reference.as_deref(), stdin, stdout),
        Command::Delete => delete(config, stdin).map(|_| ()),
        Command::DeleteQuery { query } => {
            delete_query(config, query.as_encoded_bytes()).map(|_| ())
        }
        Command::Wipe => wipe(config).map(|_| ()),
        Command::Version => version(stdout),
    }
}

fn open(config: &Config, access: Access) -> Result<History> {
    History::open(&config.db_path, access, config.lock_timeout())
}

/// Store stdin; returns the new ID when something was stored
pub fn store(
    config: &Config,
    clipboard_state: ClipboardState,
    input: &mut dyn Read,
) -> Result<Option<u64>> {
    match clipboard_state {
        ClipboardState::Sensitive => {
            debug!(target: "clipstash::cli", "clipboard marked sensitive, not storing");
            return Ok(None);
        }
        ClipboardState::Clear => {
            open(config, Access::ReadWrite)?.delete_last()?;
            return Ok(None);
        }
        ClipboardState::Data => {}
    }

    let limit = config.max_store_size as u64 + 1;
    let mut payload = Vec::new();
    (&mut *input).take(limit).read_to_end(&mut payload)?;

    if payload.len() > config.max_store_size {
        io::copy(input, &mut io::sink())?;
        debug!(target: "clipstash::cli", limit = config.max_store_size, "payload too large, not storing");
        return Ok(None);
    }
    if payload.len() < config.min_store_length {
        debug!(target: "clipstash::cli", len = payload.len(), "payload too short, not storing");
        return Ok(None);
    }

    open(config, Access::ReadWrite)?.store(&payload, config.max_dedupe_search, config.max_items)
}

/// List entries; a store that was never written lists nothing
pub fn list(config: &Config, out: &mut dyn Write) -> Result<usize> {
    let history = match open(config, Access::ReadOnly) {
        Ok(history) => history,
        Err(StashError::NotInitialized(path)) => {
            debug!(target: "clipstash::cli", path = %path.display(), "nothing stored yet");
            return Ok(0);
        }
        Err(e) => return Err(e),
    };
    let written = history.list(out, &config.preview())?;
    out.flush()?;
    Ok(written)
}

/// Write the payload for `reference` (or the first stdin line)
pub fn decode(
    config: &Config,
    reference: Option<&str>,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<()> {
    let reference = match reference {
        Some(reference) => reference.as_bytes().to_vec(),
        None => {
            let mut buf = Vec::new();
            input.read_to_end(&mut buf)?;
            buf
        }
    };

    let history = match open(config, Access::ReadOnly) {
        Ok(history) => history,
        Err(StashError::NotInitialized(path)) => {
            // Still reject malformed input even though nothing can match.
            crate::codec::parse_reference(first_line(&reference))?;
            debug!(target: "clipstash::cli", path = %path.display(), "nothing stored yet");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if let Some(payload) = history.decode(&reference)? {
        out.write_all(&payload)?;
        out.flush()?;
    }
    Ok(())
}

/// Delete the entries referenced on stdin
pub fn delete(config: &Config, input: &mut dyn Read) -> Result<usize> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;

    // Parse before opening so bad input never touches the store.
    let ids = crate::codec::parse_references(&buf)?;
    open(config, Access::ReadWrite)?.delete(&ids)
}

pub fn delete_query(config: &Config, query: &[u8]) -> Result<usize> {
    if query.is_empty() {
        return Err(StashError::EmptyQuery);
    }
    open(config, Access::ReadWrite)?.delete_query(query)
}

pub fn wipe(config: &Config) -> Result<usize> {
    open(config, Access::ReadWrite)?.wipe()
}

pub fn version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "clipstash {}", crate::VERSION)?;
    Ok(())
}

fn first_line(input: &[u8]) -> &[u8] {
    input.split(|&b| b == b'\n').next().unwrap_or(input)
}
