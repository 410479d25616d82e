//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory, writes it back when the directory list
//! changes, and falls back to defaults on first run.  It also provides the
//! [`SourceStore`](crate::application::ports::SourceStore) adapter the
//! orchestrator persists through.

pub mod config;
