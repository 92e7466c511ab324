//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML file from an explicit path or the
//! platform config directory, and falls back to defaults when no file
//! exists yet.

pub mod config;
