//! # clipstash
//!
//! A clipboard history that stays small and tidy:
//! - Bounded: at most `max_items` entries survive each store
//! - Deduplicated: storing a recent payload again moves it to the front
//! - Ordered: IDs come from a monotonic sequence and are never reused
//! - Atomic: dedup, insert and trim commit together or not at all
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     clipstash binary                         │
//! │        store | list | decode | delete | delete-query | wipe  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                cli (config + dispatch)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   History   │          │   Preview   │
//!   │ engine/query│          │ text/image  │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │    Store    │
//!   │ (one file)  │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod store;
pub mod history;
pub mod preview;
pub mod cli;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StashError, Result};
pub use config::Config;
pub use history::{Access, Entry, History};
pub use preview::Preview;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of clipstash
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
