//! Shared types for the kvstore workspace
//!
//! This crate defines the vocabulary every other kvstore crate builds on:
//! - `EngineId`: the five compiled-in engine identities and their wire prefixes
//! - `Error`/`Result`: the unified error type
//! - `Config`: per-engine tuning knobs, loadable from `kvstore.toml`
//! - `limits`: protocol-level size limits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine_id;
pub mod error;
pub mod limits;

pub use config::{ArrayConfig, Config, HashConfig, SkipListConfig, CONFIG_FILE_NAME};
pub use engine_id::EngineId;
pub use error::{Error, Result};
pub use limits::DEFAULT_MAX_TOKENS;
