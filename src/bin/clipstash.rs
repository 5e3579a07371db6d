//! clipstash binary
//!
//! Runs one history command per invocation.

use std::io::{self, BufWriter, Write};

use clap::Parser;
use clipstash::cli::{self, Args, ClipboardState, CLIPBOARD_STATE_VAR};
use clipstash::StashError;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    // Logs go to stderr; stdout carries list output and payloads.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match cli::resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let clipboard_state =
        ClipboardState::from_env_value(std::env::var(CLIPBOARD_STATE_VAR).ok().as_deref());

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let stdout = io::stdout();
    let mut stdout = BufWriter::new(stdout.lock());

    let result = cli::dispatch(
        &args.command,
        &config,
        clipboard_state,
        &mut stdin,
        &mut stdout,
    );
    let flushed = stdout.flush();

    if let Err(e) = result {
        // A closed pipe (e.g. `clipstash list | head`) is not a failure.
        if matches!(&e, StashError::Io(io_err) if io_err.kind() == io::ErrorKind::BrokenPipe) {
            return;
        }
        tracing::error!(command = ?args.command, "{}", e);
        std::process::exit(1);
    }
    if let Err(e) = flushed {
        if e.kind() != io::ErrorKind::BrokenPipe {
            tracing::error!("Failed to flush output: {}", e);
            std::process::exit(1);
        }
    }
}
