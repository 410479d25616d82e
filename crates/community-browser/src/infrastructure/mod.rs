//! Infrastructure layer for the server browser.
//!
//! Contains the I/O-facing adapters: HTTP directory access and the background
//! workers that own it, TOML configuration storage, and the serializable UI
//! snapshot.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `community_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
pub mod ui_bridge;
