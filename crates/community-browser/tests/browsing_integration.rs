//! Integration tests for source selection and the merged server list.
//!
//! These exercise the orchestrator, the source catalog, and the
//! de-duplicating merge together through the public API.

use community_browser::application::browser::{
    BrowserAction, BrowserPorts, BrowserSettings, ServerBrowser,
};
use community_browser::application::ports::mock::{
    MockAuthService, MockConnector, MockDetailsService, MockDirectoryAggregator,
    MockLanDiscovery, MockSourceStore,
};
use community_core::{
    merge_entries, DetailsRequest, DetailsResponse, DirectorySource, LanServer, PresetServer,
    ServerDetails, ServerRecord, SourceStatus, LAN_LABEL,
};

const HUB: &str = "https://hub.example";
const OTHER: &str = "https://other.example";

struct Harness {
    browser: ServerBrowser,
    aggregator: MockDirectoryAggregator,
    lan: MockLanDiscovery,
    details: MockDetailsService,
    store: MockSourceStore,
}

fn harness(lan_enabled: bool, default_source: Option<&str>, presets: Vec<PresetServer>) -> Harness {
    let aggregator = MockDirectoryAggregator::new();
    let lan = MockLanDiscovery::new();
    let details = MockDetailsService::new();
    let store = MockSourceStore::new();
    let ports = BrowserPorts {
        aggregator: Box::new(aggregator.clone()),
        lan: Some(Box::new(lan.clone())),
        auth: Box::new(MockAuthService::new()),
        details: Box::new(details.clone()),
        connector: Box::new(MockConnector::new()),
        store: Box::new(store.clone()),
    };
    let settings = BrowserSettings {
        lan_enabled,
        default_source: default_source.map(str::to_string),
        sources: vec![
            DirectorySource::new(HUB, "Hub"),
            DirectorySource::new(OTHER, ""),
        ],
        presets,
    };
    Harness {
        browser: ServerBrowser::new(ports, settings),
        aggregator,
        lan,
        details,
        store,
    }
}

fn record(host: &str, port: u16, source_host: &str) -> ServerRecord {
    ServerRecord {
        host: host.to_string(),
        port,
        name: format!("{host} on {source_host}"),
        code: format!("{host}-{port}"),
        source_host: source_host.to_string(),
        description: "short".to_string(),
        ..ServerRecord::default()
    }
}

fn labels(browser: &ServerBrowser) -> Vec<String> {
    browser
        .options()
        .iter()
        .map(|o| o.label().to_string())
        .collect()
}

#[test]
fn test_default_source_selects_matching_directory() {
    // Arrange / Act
    let h = harness(true, Some("https://other.example/"), Vec::new());

    // Assert
    assert_eq!(labels(&h.browser), vec![LAN_LABEL, "Hub", OTHER]);
    assert_eq!(h.browser.active_index(), 2);
    assert_eq!(h.aggregator.sources(), vec![OTHER.to_string()]);
    assert_eq!(h.lan.scan_count(), 0);
}

#[test]
fn test_unknown_default_falls_back_to_first_option() {
    let h = harness(false, Some("https://missing.example"), Vec::new());

    assert_eq!(h.browser.active_index(), 0);
    assert_eq!(h.aggregator.sources(), vec![HUB.to_string()]);
}

#[test]
fn test_listing_is_limited_to_active_directory_and_deduplicated() {
    // Arrange
    let mut h = harness(false, None, Vec::new());
    h.aggregator.publish(
        vec![
            record("a.example", 1, HUB),
            record("a.example", 1, HUB),
            record("b.example", 2, HUB),
            record("c.example", 3, OTHER),
        ],
        Vec::new(),
    );

    // Act
    h.browser.tick();

    // Assert
    let keys: Vec<String> = h.browser.entries().iter().map(|e| e.key()).collect();
    assert_eq!(keys, vec!["a.example:1", "b.example:2"]);
}

#[test]
fn test_lan_entry_wins_over_directory_entry_with_same_address() {
    let lan = vec![LanServer {
        host: "10.0.0.5".to_string(),
        port: 30000,
        name: "Local".to_string(),
        world: "alpha".to_string(),
        display_host: String::new(),
    }];
    let remote = vec![record("10.0.0.5", 30000, HUB)];

    let entries = merge_entries(Some(lan.as_slice()), &remote, &[]);

    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_lan());
    assert_eq!(entries[0].world.as_deref(), Some("alpha"));
}

#[test]
fn test_presets_follow_listing_and_lose_ties() {
    // Arrange
    let presets = vec![
        PresetServer {
            host: "a.example".to_string(),
            port: 1,
            name: "Duplicate".to_string(),
        },
        PresetServer {
            host: "z.example".to_string(),
            port: 9,
            name: String::new(),
        },
    ];
    let mut h = harness(false, None, presets);
    h.aggregator
        .publish(vec![record("a.example", 1, HUB)], Vec::new());

    // Act
    h.browser.tick();

    // Assert
    let entries = h.browser.entries();
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].is_preset());
    assert!(entries[1].is_preset());
    assert_eq!(entries[1].name, "z.example:9");
}

#[test]
fn test_lan_servers_show_only_while_lan_is_active() {
    let mut h = harness(true, None, Vec::new());
    h.lan.publish(vec![LanServer {
        host: "10.0.0.5".to_string(),
        port: 30000,
        name: "Local".to_string(),
        world: String::new(),
        display_host: String::new(),
    }]);
    h.browser.tick();
    assert_eq!(h.browser.entries().len(), 1);

    h.browser.push_action(BrowserAction::SelectSource(1));
    h.browser.tick();

    assert!(h.browser.entries().is_empty());
}

#[test]
fn test_full_refresh_under_lan_merges_directory_servers_after_lan() {
    // Arrange
    let mut h = harness(true, None, Vec::new());
    h.lan.publish(vec![LanServer {
        host: "10.0.0.5".to_string(),
        port: 7000,
        name: "Local".to_string(),
        world: "alpha".to_string(),
        display_host: String::new(),
    }]);
    h.browser.tick();

    // Act
    h.browser.push_action(BrowserAction::Refresh { full: true });
    h.browser.tick();
    h.aggregator.publish(
        vec![record("10.0.0.5", 7000, HUB), record("10.0.0.9", 7000, HUB)],
        Vec::new(),
    );
    h.browser.tick();

    // Assert
    assert_eq!(h.browser.active_index(), 0, "LAN stays active");
    assert_eq!(
        h.aggregator.sources(),
        vec![HUB.to_string(), OTHER.to_string()]
    );
    let entries: Vec<(String, bool)> = h
        .browser
        .entries()
        .iter()
        .map(|e| (e.key(), e.is_lan()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("10.0.0.5:7000".to_string(), true),
            ("10.0.0.9:7000".to_string(), false),
        ]
    );
}

#[test]
fn test_learned_community_name_relabels_and_persists() {
    // Arrange
    let mut h = harness(false, None, Vec::new());
    h.aggregator.publish(
        Vec::new(),
        vec![SourceStatus {
            source_host: HUB.to_string(),
            ok: true,
            community_name: "The Hub".to_string(),
            ..SourceStatus::default()
        }],
    );

    // Act
    h.browser.tick();

    // Assert
    assert_eq!(labels(&h.browser)[0], "The Hub");
    let saves = h.store.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0][0].community_name.as_deref(), Some("The Hub"));
}

#[test]
fn test_name_learning_rolls_back_when_persist_fails() {
    let mut h = harness(false, None, Vec::new());
    h.store.set_failing(true);
    h.aggregator.publish(
        Vec::new(),
        vec![SourceStatus {
            source_host: HUB.to_string(),
            ok: true,
            community_name: "The Hub".to_string(),
            ..SourceStatus::default()
        }],
    );

    h.browser.tick();

    assert_eq!(labels(&h.browser)[0], "Hub");
    assert_eq!(h.browser.sources()[0].community_name, None);
    assert!(h.store.saves().is_empty());
}

#[test]
fn test_selected_entry_gets_long_description() {
    // Arrange
    let mut h = harness(false, None, Vec::new());
    h.aggregator
        .publish(vec![record("a.example", 1, HUB)], Vec::new());
    h.browser.tick();

    // Act
    h.browser.push_action(BrowserAction::SelectEntry(0));
    h.browser.tick();
    assert_eq!(h.browser.entry_description(0), Some("short"));
    h.details.push_response(DetailsResponse::Server {
        host: HUB.to_string(),
        code: "a.example-1".to_string(),
        details: ServerDetails {
            ok: true,
            description: "A much longer description.".to_string(),
            ..ServerDetails::default()
        },
    });
    h.browser.tick();

    // Assert
    assert_eq!(
        h.details.requests(),
        vec![DetailsRequest::Server {
            host: HUB.to_string(),
            code: "a.example-1".to_string(),
        }]
    );
    assert_eq!(
        h.browser.entry_description(0),
        Some("A much longer description.")
    );
    assert_eq!(h.browser.selected_entry(), Some(0));
}

#[test]
fn test_added_source_is_selected_and_persisted() {
    let mut h = harness(true, None, Vec::new());

    h.browser.push_action(BrowserAction::AddSource {
        host: "https://new.example/".to_string(),
        name: "New".to_string(),
    });
    h.browser.tick();

    assert_eq!(labels(&h.browser).last().map(String::as_str), Some("New"));
    assert_eq!(h.browser.active_index(), 3);
    assert_eq!(h.aggregator.sources(), vec!["https://new.example".to_string()]);
    assert_eq!(h.store.saves().len(), 1);
    assert!(h.browser.is_checking_sources());
}
