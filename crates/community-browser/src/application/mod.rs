//! Application layer use cases for the server browser.
//!
//! This layer sits between the pure types in `community-core` and the
//! infrastructure (HTTP workers, TOML storage).  It drives every collaborator
//! through the traits in [`ports`] and performs no network or file I/O of its
//! own.
//!
//! # Sub-modules
//!
//! - **`browser`**       – The orchestrator: source activation, entry
//!   rebuilds on generation changes, description fetches, and dispatch of
//!   user actions.  Runs once per UI tick.
//!
//! - **`select_source`** – The configured directory list, the LAN option,
//!   the default-selection rule, and community-name learning with
//!   persist-or-rollback.
//!
//! - **`join_server`**   – The probe / login state machine, the session salt
//!   cache, and the stored credential.
//!
//! - **`status`**        – Status banners and their severities.
//!
//! - **`ports`**         – Collaborator traits plus in-memory doubles.

pub mod browser;
pub mod join_server;
pub mod ports;
pub mod select_source;
pub mod status;
