//! # community-core
//!
//! Shared library for the community server browser: domain entities, the
//! directory wire contract, and credential hashing.
//!
//! It has no dependencies on sockets, threads, UI frameworks, or the file
//! system, so everything here is testable in isolation.
//!
//! - **`domain`** – directory sources, the LAN option, server listings, and
//!   the de-duplicating merge that yields the browser's entry list.
//!
//! - **`protocol`** – the request/response unions the background workers
//!   exchange with the orchestrator, and permissive parsing of directory
//!   reply bodies.
//!
//! - **`credentials`** – PBKDF2-HMAC-SHA256 password hashing with the
//!   directory-supplied salt.

pub mod credentials;
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `community_core::BrowserEntry` instead of the full module path.
pub use credentials::{hash_password, CredentialError};
pub use domain::listing::{
    entry_key, merge_entries, BrowserEntry, EntryOrigin, LanServer, PresetServer, ServerRecord,
    SourceStatus,
};
pub use domain::source::{
    build_options, default_option_index, is_lan_token, normalize_host, DirectorySource,
    SourceOption, LAN_LABEL,
};
pub use protocol::messages::{AuthReply, AuthRequest, AuthResponse, DetailsRequest, DetailsResponse};
pub use protocol::replies::{DirectoryInfo, LoginReply, ProbeReply, ProtocolError, ServerDetails};
