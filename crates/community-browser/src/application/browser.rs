//! ServerBrowser: the foreground controller behind the server list.
//!
//! The UI pushes [`BrowserAction`]s and calls [`ServerBrowser::tick`] once per
//! frame.  A tick applies the queued actions, pumps the collaborators, rebuilds
//! the entry list when a generation counter moved, and drains the auth and
//! details reply queues.  Nothing in a tick blocks on the network.
//!
//! The browser is the only writer of the entry list, the source selection,
//! the description cache, and the pending join, so none of them need locking.
//!
//! # Generation counters (for beginners)
//!
//! The directory aggregator and LAN discovery fill their listings on
//! background threads.  Instead of pushing every change to the browser, each
//! keeps a counter that goes up by one whenever its listing is replaced.  The
//! browser remembers the last counter it saw; when either counter moved it
//! copies both listings and rebuilds the merged list from scratch:
//!
//! ```text
//! LAN servers (only while LAN is active)   first, win on host:port
//! directory servers (polled hosts only)    second
//! presets                                  last
//! ```
//!
//! A full refresh while LAN is active also fetches every configured
//! directory, so the same server may arrive from both sides; the LAN copy is
//! kept because it carries the world name and the reachable address.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use community_core::{
    merge_entries, normalize_host, BrowserEntry, DetailsResponse, DirectorySource, PresetServer,
    ServerRecord, SourceOption, SourceStatus,
};
use tracing::{debug, info, warn};

use super::join_server::{JoinFlow, JoinUpdate, StoredCredential, MSG_SELECT_SERVER};
use super::ports::{
    AuthService, DetailsService, DirectoryAggregator, LanDiscovery, ServerConnector, SourceStore,
};
use super::select_source::{SourceCatalog, SourceError};
use super::status::StatusBanner;

pub const MSG_DIRECTORY_UNREACHABLE: &str = "Could not reach directory";

/// Collaborators the browser drives.  All of them are owned.
pub struct BrowserPorts {
    pub aggregator: Box<dyn DirectoryAggregator>,
    /// `None` when this build or platform has no LAN discovery.
    pub lan: Option<Box<dyn LanDiscovery>>,
    pub auth: Box<dyn AuthService>,
    pub details: Box<dyn DetailsService>,
    pub connector: Box<dyn ServerConnector>,
    pub store: Box<dyn SourceStore>,
}

/// Startup state read from configuration.
#[derive(Debug, Clone, Default)]
pub struct BrowserSettings {
    pub lan_enabled: bool,
    pub default_source: Option<String>,
    pub sources: Vec<DirectorySource>,
    pub presets: Vec<PresetServer>,
}

/// One-shot user actions, applied at the start of the next tick in the order
/// they were pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    /// Activate the source option at this index.
    SelectSource(usize),
    AddSource { host: String, name: String },
    /// Remove the directory shown at this source option index.
    RemoveSource(usize),
    /// Refresh the active source; `full` also kicks LAN discovery.
    Refresh { full: bool },
    /// Highlight an entry and fetch its long-form description.
    SelectEntry(usize),
    /// Join the entry at this index, or report that nothing is selected.
    Join(Option<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Description {
    Pending,
    Ready(String),
    Unavailable,
}

/// The browser orchestrator.
pub struct ServerBrowser {
    ports: BrowserPorts,
    catalog: SourceCatalog,
    presets: Vec<PresetServer>,
    /// Directory hosts the aggregator was last told to poll.  Empty while LAN
    /// is active, until a full refresh asks for every configured directory.
    polled_hosts: Vec<String>,
    /// A full refresh started a LAN scan while a directory is active.
    lan_scan_pending: bool,

    entries: Vec<BrowserEntry>,
    seen_remote_generation: Option<u64>,
    seen_lan_generation: Option<u64>,
    dirty: bool,
    selected_entry: Option<usize>,

    join: JoinFlow,
    descriptions: HashMap<(String, String), Description>,
    /// Hosts whose `/api/info` reply decides whether to warn after an add.
    reachability_checks: HashSet<String>,

    status: Option<StatusBanner>,
    username: String,
    password: String,
    /// World reported on login when the entry does not advertise one.
    world: Option<String>,
    actions: VecDeque<BrowserAction>,
}

impl ServerBrowser {
    /// Builds the browser and activates the default source.
    pub fn new(ports: BrowserPorts, settings: BrowserSettings) -> Self {
        let lan_enabled = settings.lan_enabled && ports.lan.is_some();
        let catalog = SourceCatalog::new(settings.sources, lan_enabled, settings.default_source);

        let mut browser = Self {
            ports,
            catalog,
            presets: settings.presets,
            polled_hosts: Vec::new(),
            lan_scan_pending: false,
            entries: Vec::new(),
            seen_remote_generation: None,
            seen_lan_generation: None,
            dirty: true,
            selected_entry: None,
            join: JoinFlow::new(),
            descriptions: HashMap::new(),
            reachability_checks: HashSet::new(),
            status: None,
            username: String::new(),
            password: String::new(),
            world: None,
            actions: VecDeque::new(),
        };
        browser.activate_source();
        browser
    }

    // ── UI-facing state ─────────────────────────────────────────────────────

    pub fn entries(&self) -> &[BrowserEntry] {
        &self.entries
    }

    pub fn options(&self) -> &[SourceOption] {
        self.catalog.options()
    }

    pub fn active_index(&self) -> usize {
        self.catalog.active_index()
    }

    pub fn sources(&self) -> &[DirectorySource] {
        self.catalog.sources()
    }

    pub fn presets(&self) -> &[PresetServer] {
        &self.presets
    }

    pub fn status(&self) -> Option<&StatusBanner> {
        self.status.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn selected_entry(&self) -> Option<usize> {
        self.selected_entry
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_world(&mut self, world: Option<String>) {
        self.world = world.filter(|w| !w.trim().is_empty());
    }

    pub fn stored_credential(&self) -> Option<&StoredCredential> {
        self.join.stored_credential()
    }

    pub fn set_stored_credential(&mut self, credential: Option<StoredCredential>) {
        self.join.set_stored_credential(credential);
    }

    /// `true` while either producer is still gathering servers.
    pub fn is_fetching(&self) -> bool {
        let lan_scanning = self
            .ports
            .lan
            .as_ref()
            .is_some_and(|lan| self.catalog.is_lan_active() && lan.is_scanning());
        lan_scanning || self.ports.aggregator.is_fetching()
    }

    pub fn is_joining(&self) -> bool {
        self.join.is_pending()
    }

    /// `true` while a newly added directory's `/api/info` reply is outstanding.
    pub fn is_checking_sources(&self) -> bool {
        !self.reachability_checks.is_empty()
    }

    pub fn source_statuses(&self) -> Vec<SourceStatus> {
        self.ports.aggregator.source_statuses()
    }

    /// Long-form description when fetched, else the listing's short one.
    pub fn entry_description(&self, index: usize) -> Option<&str> {
        let entry = self.entries.get(index)?;
        if let Some((host, code)) = entry.description_key() {
            let key = (host.to_string(), code.to_string());
            if let Some(Description::Ready(text)) = self.descriptions.get(&key) {
                return Some(text);
            }
        }
        Some(&entry.description)
    }

    /// Queues a user action for the next tick.
    pub fn push_action(&mut self, action: BrowserAction) {
        self.actions.push_back(action);
    }

    // ── Tick ────────────────────────────────────────────────────────────────

    /// Runs one foreground iteration.
    pub fn tick(&mut self) {
        while let Some(action) = self.actions.pop_front() {
            self.apply_action(action);
        }

        self.pump_lan();
        self.ports.aggregator.update();

        let remote_generation = self.ports.aggregator.generation();
        let lan_generation = self.ports.lan.as_ref().map(|lan| lan.generation());
        let remote_changed = self.seen_remote_generation != Some(remote_generation);
        let lan_changed = self.seen_lan_generation != lan_generation;

        if remote_changed {
            self.learn_names_from_aggregator();
        }
        if remote_changed || lan_changed || self.dirty {
            self.seen_remote_generation = Some(remote_generation);
            self.seen_lan_generation = lan_generation;
            self.rebuild_entries();
        }

        while let Some(response) = self.ports.auth.consume_response() {
            let update = self.join.handle_response(response, self.ports.auth.as_mut());
            self.apply_join_update(update);
        }

        while let Some(response) = self.ports.details.consume_response() {
            self.handle_details(response);
        }
    }

    /// LAN discovery only runs while LAN is the active source or a full
    /// refresh scan is outstanding.
    fn pump_lan(&mut self) {
        let lan_active = self.catalog.is_lan_active();
        if !lan_active && !self.lan_scan_pending {
            return;
        }
        if let Some(lan) = self.ports.lan.as_mut() {
            lan.update();
            if self.lan_scan_pending && !lan.is_scanning() {
                debug!("full-refresh LAN scan finished");
                self.lan_scan_pending = false;
            }
        }
    }

    fn apply_action(&mut self, action: BrowserAction) {
        match action {
            BrowserAction::SelectSource(index) => match self.catalog.select(index) {
                Ok(true) => {
                    debug!("source option {index} selected");
                    self.activate_source();
                }
                Ok(false) => {}
                Err(e) => self.status = Some(StatusBanner::warning(e.to_string())),
            },
            BrowserAction::AddSource { host, name } => self.add_source(&host, &name),
            BrowserAction::RemoveSource(index) => self.remove_source(index),
            BrowserAction::Refresh { full } => self.refresh(full),
            BrowserAction::SelectEntry(index) => self.select_entry(index),
            BrowserAction::Join(index) => self.start_join(index),
        }
    }

    // ── Sources ─────────────────────────────────────────────────────────────

    /// Points the producers at the active option: LAN scans, or the one
    /// directory is polled.  Never both; only a full refresh widens this.
    fn activate_source(&mut self) {
        self.polled_hosts = self
            .catalog
            .active_host()
            .map(|host| vec![host.to_string()])
            .unwrap_or_default();
        self.ports.aggregator.set_sources(self.polled_hosts.clone());
        self.lan_scan_pending = false;

        if self.catalog.is_lan_active() {
            debug!("activating LAN discovery");
            if let Some(lan) = self.ports.lan.as_mut() {
                lan.start_scan();
            }
        } else {
            debug!("activating directories {:?}", self.polled_hosts);
            self.ports.aggregator.request_refresh();
        }

        self.selected_entry = None;
        self.dirty = true;
    }

    /// A plain refresh re-fetches the active source.  A full refresh also
    /// scans the LAN and, while LAN is active, fetches every configured
    /// directory so remote servers are listed after the LAN ones.
    fn refresh(&mut self, full: bool) {
        debug!("refresh requested (full: {full})");
        let lan_active = self.catalog.is_lan_active();
        if (full || lan_active) && self.catalog.lan_enabled() {
            if let Some(lan) = self.ports.lan.as_mut() {
                lan.start_scan();
                self.lan_scan_pending = !lan_active;
            }
        }

        if lan_active && full {
            self.polled_hosts = self
                .catalog
                .sources()
                .iter()
                .map(|source| source.host.clone())
                .collect();
            debug!("full refresh polls directories {:?}", self.polled_hosts);
            self.ports.aggregator.set_sources(self.polled_hosts.clone());
            self.dirty = true;
        }
        if full || !lan_active {
            self.ports.aggregator.request_refresh();
        }
    }

    fn add_source(&mut self, host: &str, name: &str) {
        match self.catalog.add(host, name, self.ports.store.as_mut()) {
            Ok(index) => {
                let host = normalize_host(host);
                info!("added directory {host}");
                self.reachability_checks.insert(host.clone());
                self.ports.details.request_info(&host);
                if let Err(e) = self.catalog.select(index) {
                    warn!("new directory option vanished: {e}");
                }
                self.activate_source();
                self.status = Some(StatusBanner::info(format!("Added directory {host}.")));
            }
            Err(e) => self.status = Some(source_error_banner(&e)),
        }
    }

    fn remove_source(&mut self, index: usize) {
        let active_before = self.catalog.active_option().cloned();
        match self.catalog.remove(index, self.ports.store.as_mut()) {
            Ok(removed) => {
                info!("removed directory {}", removed.host);
                if self.catalog.active_option() != active_before.as_ref() {
                    self.activate_source();
                } else if self.polled_hosts.contains(&removed.host) {
                    self.polled_hosts.retain(|host| *host != removed.host);
                    self.ports.aggregator.set_sources(self.polled_hosts.clone());
                    self.dirty = true;
                }
                self.status = Some(StatusBanner::info(format!(
                    "Removed directory {}.",
                    removed.host
                )));
            }
            Err(e) => self.status = Some(source_error_banner(&e)),
        }
    }

    /// Feeds community names reported by the aggregator into the catalog.
    fn learn_names_from_aggregator(&mut self) {
        let mut names: BTreeMap<String, String> = BTreeMap::new();
        for status in self.ports.aggregator.source_statuses() {
            if !status.community_name.is_empty() {
                names.insert(normalize_host(&status.source_host), status.community_name);
            }
        }
        for record in self.ports.aggregator.servers() {
            if !record.source_name.is_empty() {
                names
                    .entry(normalize_host(&record.source_host))
                    .or_insert(record.source_name);
            }
        }
        for (host, name) in names {
            self.catalog.learn_name(&host, &name, self.ports.store.as_mut());
        }
    }

    // ── Entries ─────────────────────────────────────────────────────────────

    /// Rebuilds the whole list and swaps it in.  Remote records are kept only
    /// for polled hosts; LAN records come first and win on `host:port`.
    fn rebuild_entries(&mut self) {
        let lan_servers = match self.ports.lan.as_ref() {
            Some(lan) if self.catalog.is_lan_active() => Some(lan.servers()),
            _ => None,
        };
        let polled = &self.polled_hosts;
        let remote: Vec<ServerRecord> = self
            .ports
            .aggregator
            .servers()
            .into_iter()
            .filter(|record| {
                polled.iter().any(|host| *host == record.source_host)
                    || (record.source_host.is_empty() && !polled.is_empty())
            })
            .collect();

        self.entries = merge_entries(lan_servers.as_deref(), &remote, &self.presets);
        self.dirty = false;
        if self.selected_entry.is_some_and(|i| i >= self.entries.len()) {
            self.selected_entry = None;
        }
        debug!(
            "rebuilt {} entries ({} LAN, {} remote, {} presets)",
            self.entries.len(),
            lan_servers.as_ref().map_or(0, Vec::len),
            remote.len(),
            self.presets.len()
        );
    }

    fn select_entry(&mut self, index: usize) {
        let Some(entry) = self.entries.get(index) else {
            return;
        };
        self.selected_entry = Some(index);

        let Some((host, code)) = entry.description_key() else {
            return;
        };
        let key = (host.to_string(), code.to_string());
        if self.descriptions.contains_key(&key) {
            return;
        }
        debug!("fetching description for {code} from {host}");
        self.ports.details.request_server_details(host, code);
        self.descriptions.insert(key, Description::Pending);
    }

    fn handle_details(&mut self, response: DetailsResponse) {
        match response {
            DetailsResponse::Info { host, info } => {
                let checked = self.reachability_checks.remove(&host);
                if !info.ok {
                    debug!("directory {host} info failed: {}", info.error);
                    if checked {
                        self.status = Some(StatusBanner::warning(format!(
                            "{MSG_DIRECTORY_UNREACHABLE} {host}."
                        )));
                    }
                    return;
                }
                if !info.community_name.is_empty() {
                    self.catalog
                        .learn_name(&host, &info.community_name, self.ports.store.as_mut());
                }
            }
            DetailsResponse::Server {
                host,
                code,
                details,
            } => {
                let state = if details.ok && !details.description.is_empty() {
                    Description::Ready(details.description)
                } else {
                    debug!("no description for {code} from {host}: {}", details.error);
                    Description::Unavailable
                };
                self.descriptions.insert((host, code), state);
            }
        }
    }

    // ── Join ────────────────────────────────────────────────────────────────

    fn start_join(&mut self, index: Option<usize>) {
        let Some(mut entry) = index.and_then(|i| self.entries.get(i)).cloned() else {
            self.status = Some(StatusBanner::warning(MSG_SELECT_SERVER));
            return;
        };
        self.status = None;
        if entry.world.is_none() {
            entry.world = self.world.clone();
        }

        let host = match entry.source_host() {
            Some(host) => Some(host.to_string()),
            None if entry.is_preset() => None,
            None => self.catalog.active_host().map(str::to_string),
        };
        debug!("join {} via {:?}", entry.key(), host);

        let update = self.join.start(
            entry,
            host,
            &self.username,
            &self.password,
            self.ports.auth.as_mut(),
        );
        self.apply_join_update(update);
    }

    fn apply_join_update(&mut self, update: JoinUpdate) {
        match update {
            JoinUpdate::Connect(request) => {
                self.status = None;
                self.ports.connector.connect(request);
            }
            JoinUpdate::Failed(banner) => self.status = Some(banner),
            JoinUpdate::Waiting | JoinUpdate::Ignored => {}
        }
    }
}

fn source_error_banner(error: &SourceError) -> StatusBanner {
    match error {
        SourceError::Persist(_) => StatusBanner::error(error.to_string()),
        _ => StatusBanner::warning(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::mock::{
        MockAuthService, MockConnector, MockDetailsService, MockDirectoryAggregator,
        MockLanDiscovery, MockSourceStore,
    };
    use crate::application::status::Severity;
    use community_core::{DetailsRequest, DirectoryInfo, LanServer, ServerDetails};

    struct Harness {
        aggregator: MockDirectoryAggregator,
        lan: MockLanDiscovery,
        details: MockDetailsService,
        connector: MockConnector,
        store: MockSourceStore,
    }

    fn browser(lan_enabled: bool, default: Option<&str>) -> (ServerBrowser, Harness) {
        let harness = Harness {
            aggregator: MockDirectoryAggregator::new(),
            lan: MockLanDiscovery::new(),
            details: MockDetailsService::new(),
            connector: MockConnector::new(),
            store: MockSourceStore::new(),
        };
        let ports = BrowserPorts {
            aggregator: Box::new(harness.aggregator.clone()),
            lan: Some(Box::new(harness.lan.clone())),
            auth: Box::new(MockAuthService::new()),
            details: Box::new(harness.details.clone()),
            connector: Box::new(harness.connector.clone()),
            store: Box::new(harness.store.clone()),
        };
        let settings = BrowserSettings {
            lan_enabled,
            default_source: default.map(str::to_string),
            sources: vec![DirectorySource::new("https://hub.example", "Hub")],
            presets: Vec::new(),
        };
        (ServerBrowser::new(ports, settings), harness)
    }

    fn record(host: &str, port: u16, code: &str) -> ServerRecord {
        ServerRecord {
            host: host.to_string(),
            port,
            name: host.to_string(),
            code: code.to_string(),
            source_host: "https://hub.example".to_string(),
            description: "short".to_string(),
            ..ServerRecord::default()
        }
    }

    #[test]
    fn test_new_activates_lan_by_default() {
        let (browser, harness) = browser(true, None);
        assert_eq!(browser.active_index(), 0);
        assert_eq!(harness.lan.scan_count(), 1);
        assert_eq!(harness.aggregator.refresh_count(), 0);
        assert!(harness.aggregator.sources().is_empty());
    }

    #[test]
    fn test_selecting_directory_switches_polling() {
        // Arrange
        let (mut browser, harness) = browser(true, None);

        // Act
        browser.push_action(BrowserAction::SelectSource(1));
        browser.tick();

        // Assert
        assert_eq!(harness.aggregator.sources(), vec!["https://hub.example".to_string()]);
        assert_eq!(harness.aggregator.refresh_count(), 1);
        assert_eq!(harness.lan.scan_count(), 1);
    }

    #[test]
    fn test_tick_rebuilds_only_when_generation_moves() {
        let (mut browser, harness) = browser(false, None);
        harness
            .aggregator
            .publish(vec![record("a.example", 1, "c1")], Vec::new());
        browser.tick();
        assert_eq!(browser.entries().len(), 1);

        browser.tick();
        assert_eq!(browser.entries().len(), 1);
    }

    #[test]
    fn test_lan_is_not_pumped_while_directory_active() {
        let (mut browser, harness) = browser(true, Some("https://hub.example"));

        browser.tick();
        browser.tick();

        assert_eq!(harness.lan.update_count(), 0);
    }

    #[test]
    fn test_full_refresh_pumps_lan_until_scan_finishes() {
        // Arrange
        let (mut browser, harness) = browser(true, Some("https://hub.example"));

        // Act
        browser.push_action(BrowserAction::Refresh { full: true });
        browser.tick();
        browser.tick();
        harness.lan.publish(Vec::new());
        browser.tick();
        browser.tick();

        // Assert
        assert_eq!(harness.lan.scan_count(), 1);
        assert_eq!(harness.lan.update_count(), 3);
        assert_eq!(harness.aggregator.refresh_count(), 2);
        assert_eq!(harness.aggregator.sources(), vec!["https://hub.example".to_string()]);
    }

    #[test]
    fn test_full_refresh_under_lan_polls_every_directory() {
        let (mut browser, harness) = browser(true, None);

        browser.push_action(BrowserAction::Refresh { full: true });
        browser.tick();

        assert_eq!(harness.aggregator.sources(), vec!["https://hub.example".to_string()]);
        assert_eq!(harness.aggregator.refresh_count(), 1);
        assert_eq!(harness.lan.scan_count(), 2);
    }

    #[test]
    fn test_lan_records_are_hidden_when_directory_active() {
        let (mut browser, harness) = browser(true, Some("https://hub.example"));
        harness.lan.publish(vec![LanServer {
            host: "10.0.0.2".to_string(),
            port: 30000,
            ..LanServer::default()
        }]);

        browser.tick();

        assert!(browser.entries().is_empty());
    }

    #[test]
    fn test_select_entry_fetches_description_once() {
        let (mut browser, harness) = browser(false, None);
        harness
            .aggregator
            .publish(vec![record("a.example", 1, "c1")], Vec::new());
        browser.tick();

        browser.push_action(BrowserAction::SelectEntry(0));
        browser.push_action(BrowserAction::SelectEntry(0));
        browser.tick();

        assert_eq!(
            harness.details.requests(),
            vec![DetailsRequest::Server {
                host: "https://hub.example".to_string(),
                code: "c1".to_string(),
            }]
        );
        assert_eq!(browser.entry_description(0), Some("short"));

        harness.details.push_response(DetailsResponse::Server {
            host: "https://hub.example".to_string(),
            code: "c1".to_string(),
            details: ServerDetails {
                ok: true,
                description: "long form".to_string(),
                ..ServerDetails::default()
            },
        });
        browser.tick();
        assert_eq!(browser.entry_description(0), Some("long form"));
    }

    #[test]
    fn test_add_source_checks_reachability_and_warns_on_failure() {
        // Arrange
        let (mut browser, harness) = browser(true, None);
        browser.push_action(BrowserAction::AddSource {
            host: "https://new.example/".to_string(),
            name: String::new(),
        });
        browser.tick();

        // Act
        harness.details.push_response(DetailsResponse::Info {
            host: "https://new.example".to_string(),
            info: DirectoryInfo::failed("request_failed"),
        });
        browser.tick();

        // Assert
        assert_eq!(browser.active_index(), 2);
        assert_eq!(browser.sources().len(), 2);
        assert_eq!(harness.store.saves().len(), 1);
        let status = browser.status().expect("banner");
        assert_eq!(status.severity, Severity::Warning);
        assert!(status.message.starts_with(MSG_DIRECTORY_UNREACHABLE));
    }

    #[test]
    fn test_info_reply_teaches_community_name() {
        let (mut browser, harness) = browser(true, None);
        harness.details.push_response(DetailsResponse::Info {
            host: "https://hub.example".to_string(),
            info: DirectoryInfo {
                ok: true,
                community_name: "The Hub".to_string(),
                ..DirectoryInfo::default()
            },
        });

        browser.tick();

        assert_eq!(browser.options()[1].label(), "The Hub");
        assert_eq!(harness.store.saves().len(), 1);
    }

    #[test]
    fn test_remove_lan_option_shows_warning() {
        let (mut browser, _harness) = browser(true, None);
        browser.push_action(BrowserAction::RemoveSource(0));
        browser.tick();
        assert_eq!(browser.status().map(|s| s.severity), Some(Severity::Warning));
    }

    #[test]
    fn test_join_without_selection_asks_for_one() {
        let (mut browser, harness) = browser(true, None);
        browser.push_action(BrowserAction::Join(None));
        browser.tick();
        assert_eq!(
            browser.status(),
            Some(&StatusBanner::warning(MSG_SELECT_SERVER))
        );
        assert!(harness.connector.connects().is_empty());
    }

    #[test]
    fn test_join_preset_is_anonymous_even_with_directory_active() {
        let (mut browser, harness) = browser(false, None);
        browser.presets.push(PresetServer {
            host: "play.example".to_string(),
            port: 30000,
            name: "Preset".to_string(),
        });
        browser.set_username("sam");
        browser.tick();

        browser.push_action(BrowserAction::Join(Some(0)));
        browser.tick();

        let connects = harness.connector.connects();
        assert_eq!(connects.len(), 1);
        assert_eq!(connects[0].community_host, None);
        assert!(!connects[0].registered);
    }
}
