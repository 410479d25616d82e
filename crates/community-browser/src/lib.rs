//! community-browser library.
//!
//! The `community-browser` binary and the integration tests under `tests/`
//! both build on this module tree:
//!
//! - **`application`** – the orchestrator, source catalog, join flow, and
//!   the port traits it drives.
//! - **`infrastructure`** – HTTP workers, TOML config storage, and the UI
//!   snapshot DTOs.

pub mod application;
pub mod infrastructure;
