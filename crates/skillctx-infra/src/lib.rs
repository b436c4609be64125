//! Infrastructure layer for skillctx.
//!
//! Filesystem corpus loading, `config.toml` handling, data directory
//! layout, and the debounced corpus watcher that drives reloads of the
//! resolver defined in `skillctx-core`.

pub mod config;
pub mod filesystem;
pub mod skill;
