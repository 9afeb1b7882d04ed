//! Krepsys - a self-hosted newsletter reader backend.
//!
//! Krepsys polls registered RSS/Atom feeds on a per-feed schedule,
//! normalizes the entries, and stores new articles deduplicated by URL.
//! Stored articles carry read/saved/archived state, tags, notes, and
//! highlights.

pub mod article;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{KrepsysError, Result};
