//! In-memory doubles for the application ports.
//!
//! Every double keeps its state behind an `Arc<Mutex<..>>` so a test can hand
//! a clone to the orchestrator (which takes ownership of a `Box<dyn ..>`) and
//! keep another clone to inject data and inspect the calls that were made.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use community_core::{
    AuthRequest, AuthResponse, DetailsRequest, DetailsResponse, DirectorySource, LanServer,
    ServerRecord, SourceStatus,
};

use super::{
    AuthService, ConnectRequest, DetailsService, DirectoryAggregator, LanDiscovery,
    ServerConnector, SourceStore,
};

// ── AuthService ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct AuthState {
    requests: Vec<AuthRequest>,
    responses: VecDeque<AuthResponse>,
}

/// Records auth requests; replies are queued by the test.
#[derive(Clone, Default)]
pub struct MockAuthService {
    state: Arc<Mutex<AuthState>>,
}

impl MockAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request issued so far, in order.
    pub fn requests(&self) -> Vec<AuthRequest> {
        self.state.lock().expect("lock poisoned").requests.clone()
    }

    /// Queues a reply for the next `consume_response` call.
    pub fn push_response(&self, response: AuthResponse) {
        self.state
            .lock()
            .expect("lock poisoned")
            .responses
            .push_back(response);
    }
}

impl AuthService for MockAuthService {
    fn request_user_registered(&mut self, host: &str, username: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .requests
            .push(AuthRequest::Probe {
                host: host.to_string(),
                username: username.to_string(),
            });
    }

    fn request_auth(&mut self, host: &str, username: &str, passhash: &str, world: Option<&str>) {
        self.state
            .lock()
            .expect("lock poisoned")
            .requests
            .push(AuthRequest::Login {
                host: host.to_string(),
                username: username.to_string(),
                passhash: passhash.to_string(),
                world: world.map(str::to_string),
            });
    }

    fn consume_response(&mut self) -> Option<AuthResponse> {
        self.state.lock().expect("lock poisoned").responses.pop_front()
    }
}

// ── DetailsService ────────────────────────────────────────────────────────────

#[derive(Default)]
struct DetailsState {
    requests: Vec<DetailsRequest>,
    responses: VecDeque<DetailsResponse>,
}

/// Records details requests; replies are queued by the test.
#[derive(Clone, Default)]
pub struct MockDetailsService {
    state: Arc<Mutex<DetailsState>>,
}

impl MockDetailsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<DetailsRequest> {
        self.state.lock().expect("lock poisoned").requests.clone()
    }

    pub fn push_response(&self, response: DetailsResponse) {
        self.state
            .lock()
            .expect("lock poisoned")
            .responses
            .push_back(response);
    }
}

impl DetailsService for MockDetailsService {
    fn request_info(&mut self, host: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .requests
            .push(DetailsRequest::Info {
                host: host.to_string(),
            });
    }

    fn request_server_details(&mut self, host: &str, code: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .requests
            .push(DetailsRequest::Server {
                host: host.to_string(),
                code: code.to_string(),
            });
    }

    fn consume_response(&mut self) -> Option<DetailsResponse> {
        self.state.lock().expect("lock poisoned").responses.pop_front()
    }
}

// ── DirectoryAggregator ───────────────────────────────────────────────────────

#[derive(Default)]
struct AggregatorState {
    sources: Vec<String>,
    refreshes: u32,
    fetching: bool,
    generation: u64,
    servers: Vec<ServerRecord>,
    statuses: Vec<SourceStatus>,
}

/// An aggregator whose listing is published by the test.
#[derive(Clone, Default)]
pub struct MockDirectoryAggregator {
    state: Arc<Mutex<AggregatorState>>,
}

impl MockDirectoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listing and bumps the generation counter.
    pub fn publish(&self, servers: Vec<ServerRecord>, statuses: Vec<SourceStatus>) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.servers = servers;
        state.statuses = statuses;
        state.generation += 1;
        state.fetching = false;
    }

    pub fn set_fetching(&self, fetching: bool) {
        self.state.lock().expect("lock poisoned").fetching = fetching;
    }

    /// Hosts most recently passed to `set_sources`.
    pub fn sources(&self) -> Vec<String> {
        self.state.lock().expect("lock poisoned").sources.clone()
    }

    pub fn refresh_count(&self) -> u32 {
        self.state.lock().expect("lock poisoned").refreshes
    }
}

impl DirectoryAggregator for MockDirectoryAggregator {
    fn set_sources(&mut self, hosts: Vec<String>) {
        self.state.lock().expect("lock poisoned").sources = hosts;
    }

    fn request_refresh(&mut self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.refreshes += 1;
        state.fetching = true;
    }

    fn update(&mut self) {}

    fn is_fetching(&self) -> bool {
        self.state.lock().expect("lock poisoned").fetching
    }

    fn generation(&self) -> u64 {
        self.state.lock().expect("lock poisoned").generation
    }

    fn servers(&self) -> Vec<ServerRecord> {
        self.state.lock().expect("lock poisoned").servers.clone()
    }

    fn source_statuses(&self) -> Vec<SourceStatus> {
        self.state.lock().expect("lock poisoned").statuses.clone()
    }
}

// ── LanDiscovery ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct LanState {
    scans: u32,
    updates: u32,
    scanning: bool,
    generation: u64,
    servers: Vec<LanServer>,
}

/// LAN discovery whose results are published by the test.
#[derive(Clone, Default)]
pub struct MockLanDiscovery {
    state: Arc<Mutex<LanState>>,
}

impl MockLanDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, servers: Vec<LanServer>) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.servers = servers;
        state.generation += 1;
        state.scanning = false;
    }

    pub fn scan_count(&self) -> u32 {
        self.state.lock().expect("lock poisoned").scans
    }

    pub fn update_count(&self) -> u32 {
        self.state.lock().expect("lock poisoned").updates
    }
}

impl LanDiscovery for MockLanDiscovery {
    fn start_scan(&mut self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.scans += 1;
        state.scanning = true;
    }

    fn update(&mut self) {
        self.state.lock().expect("lock poisoned").updates += 1;
    }

    fn is_scanning(&self) -> bool {
        self.state.lock().expect("lock poisoned").scanning
    }

    fn generation(&self) -> u64 {
        self.state.lock().expect("lock poisoned").generation
    }

    fn servers(&self) -> Vec<LanServer> {
        self.state.lock().expect("lock poisoned").servers.clone()
    }
}

// ── ServerConnector ───────────────────────────────────────────────────────────

/// Records every connection request.
#[derive(Clone, Default)]
pub struct MockConnector {
    connects: Arc<Mutex<Vec<ConnectRequest>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connects(&self) -> Vec<ConnectRequest> {
        self.connects.lock().expect("lock poisoned").clone()
    }
}

impl ServerConnector for MockConnector {
    fn connect(&mut self, request: ConnectRequest) {
        self.connects.lock().expect("lock poisoned").push(request);
    }
}

// ── SourceStore ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    saved: Vec<Vec<DirectorySource>>,
    fail: bool,
}

/// Keeps every successful save; can be told to fail.
#[derive(Clone, Default)]
pub struct MockSourceStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().expect("lock poisoned").fail = fail;
    }

    /// Successful saves, oldest first.
    pub fn saves(&self) -> Vec<Vec<DirectorySource>> {
        self.state.lock().expect("lock poisoned").saved.clone()
    }
}

impl SourceStore for MockSourceStore {
    fn save_sources(&mut self, sources: &[DirectorySource]) -> Result<(), String> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.fail {
            return Err("disk full".to_string());
        }
        state.saved.push(sources.to_vec());
        Ok(())
    }
}
