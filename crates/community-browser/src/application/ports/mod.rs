//! Ports: the traits the application layer drives its collaborators through.
//!
//! Infrastructure implements these with real HTTP workers and TOML storage;
//! tests use the shared-state doubles in [`mock`].  Nothing in
//! here blocks: every method either enqueues work or reads state that a
//! background worker has already published.

pub mod mock;

use community_core::{
    AuthResponse, BrowserEntry, DetailsResponse, DirectorySource, LanServer, ServerRecord,
    SourceStatus,
};

/// Polls one or more remote directories for their server lists.
pub trait DirectoryAggregator: Send {
    /// Restricts polling to `hosts`.  An empty list disables remote polling.
    fn set_sources(&mut self, hosts: Vec<String>);
    /// Asks for a fresh fetch of every configured source.
    fn request_refresh(&mut self);
    /// Pumps results published by the background fetcher.  Called once per tick.
    fn update(&mut self);
    fn is_fetching(&self) -> bool;
    /// Bumped whenever [`servers`](Self::servers) changes.
    fn generation(&self) -> u64;
    fn servers(&self) -> Vec<ServerRecord>;
    fn source_statuses(&self) -> Vec<SourceStatus>;
}

/// LAN broadcast discovery.
pub trait LanDiscovery: Send {
    fn start_scan(&mut self);
    fn update(&mut self);
    fn is_scanning(&self) -> bool;
    fn generation(&self) -> u64;
    fn servers(&self) -> Vec<LanServer>;
}

/// Registration probe and credentialed login against a directory.
pub trait AuthService: Send {
    fn request_user_registered(&mut self, host: &str, username: &str);
    fn request_auth(&mut self, host: &str, username: &str, passhash: &str, world: Option<&str>);
    /// Non-blocking pop; `None` when nothing is queued.
    fn consume_response(&mut self) -> Option<AuthResponse>;
}

/// Directory metadata and long-form server descriptions.
pub trait DetailsService: Send {
    fn request_info(&mut self, host: &str);
    fn request_server_details(&mut self, host: &str, code: &str);
    fn consume_response(&mut self) -> Option<DetailsResponse>;
}

/// Persists the configured directory list.
pub trait SourceStore: Send {
    /// Writes `sources` to durable storage.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason; the caller rolls back its in-memory
    /// change and keeps going.
    fn save_sources(&mut self, sources: &[DirectorySource]) -> Result<(), String>;
}

/// What the transport layer needs to open a game connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub entry: BrowserEntry,
    pub username: String,
    /// Directory the login was checked against; `None` for anonymous joins.
    pub community_host: Option<String>,
    /// `true` only after a successful `/api/auth`.
    pub registered: bool,
    pub community_admin: bool,
    pub local_admin: bool,
}

/// Connection callback toward the game transport.
pub trait ServerConnector: Send {
    fn connect(&mut self, request: ConnectRequest);
}
