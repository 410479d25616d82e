//! UI bridge: serializable snapshots of the browser's UI-visible state.
//!
//! The orchestrator works with internal types (`BrowserEntry`, `SourceOption`,
//! `StatusBanner`) that carry enums and borrowed data.  The DTOs here flatten
//! them into plain JSON-friendly structs for any presentation layer; the
//! command-line front end prints them with `--json`.

use serde::{Deserialize, Serialize};

use community_core::{BrowserEntry, EntryOrigin, SourceOption};

use crate::application::browser::ServerBrowser;
use crate::application::status::StatusBanner;

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// One option in the source selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOptionDto {
    pub label: String,
    /// `None` for the LAN option.
    pub host: Option<String>,
    pub active: bool,
}

/// One row of the server list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDto {
    pub address: String,
    pub name: String,
    pub display_host: String,
    /// `"lan"`, `"directory"`, or `"preset"`.
    pub origin: String,
    pub source_host: Option<String>,
    pub game_mode: String,
    pub active_players: u32,
    pub max_players: u32,
    pub flags: Vec<String>,
    pub description: String,
}

/// The status banner, if one is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    /// `"info"`, `"warning"`, or `"error"`.
    pub severity: String,
    pub message: String,
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSnapshot {
    pub options: Vec<SourceOptionDto>,
    pub active_index: usize,
    pub entries: Vec<EntryDto>,
    pub status: Option<StatusDto>,
    pub fetching: bool,
    pub joining: bool,
}

impl BrowserSnapshot {
    /// Captures the browser's current state.
    pub fn capture(browser: &ServerBrowser) -> Self {
        let active_index = browser.active_index();
        let options = browser
            .options()
            .iter()
            .enumerate()
            .map(|(i, option)| option_dto(option, i == active_index))
            .collect();
        let entries = browser
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let description = browser.entry_description(i).unwrap_or_default();
                entry_dto(entry, description)
            })
            .collect();

        Self {
            options,
            active_index,
            entries,
            status: browser.status().map(status_dto),
            fetching: browser.is_fetching(),
            joining: browser.is_joining(),
        }
    }
}

fn option_dto(option: &SourceOption, active: bool) -> SourceOptionDto {
    SourceOptionDto {
        label: option.label().to_string(),
        host: option.host().map(str::to_string),
        active,
    }
}

fn entry_dto(entry: &BrowserEntry, description: &str) -> EntryDto {
    let origin = match entry.origin {
        EntryOrigin::Lan => "lan",
        EntryOrigin::Directory { .. } => "directory",
        EntryOrigin::Preset => "preset",
    };
    EntryDto {
        address: entry.key(),
        name: entry.name.clone(),
        display_host: entry.display_host.clone(),
        origin: origin.to_string(),
        source_host: entry.source_host().map(str::to_string),
        game_mode: entry.game_mode.clone(),
        active_players: entry.active_players,
        max_players: entry.max_players,
        flags: entry.flags.clone(),
        description: description.to_string(),
    }
}

fn status_dto(banner: &StatusBanner) -> StatusDto {
    StatusDto {
        severity: banner.severity.as_str().to_string(),
        message: banner.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::browser::{BrowserPorts, BrowserSettings};
    use crate::application::ports::mock::{
        MockAuthService, MockConnector, MockDetailsService, MockDirectoryAggregator,
        MockSourceStore,
    };
    use community_core::{DirectorySource, PresetServer, ServerRecord};

    fn browser(aggregator: MockDirectoryAggregator) -> ServerBrowser {
        let ports = BrowserPorts {
            aggregator: Box::new(aggregator),
            lan: None,
            auth: Box::new(MockAuthService::new()),
            details: Box::new(MockDetailsService::new()),
            connector: Box::new(MockConnector::new()),
            store: Box::new(MockSourceStore::new()),
        };
        ServerBrowser::new(
            ports,
            BrowserSettings {
                lan_enabled: true,
                default_source: None,
                sources: vec![DirectorySource::new("https://hub.example", "Hub")],
                presets: vec![PresetServer {
                    host: "play.example".to_string(),
                    port: 30000,
                    name: "Preset".to_string(),
                }],
            },
        )
    }

    #[test]
    fn test_capture_without_lan_discovery_lists_directory_only() {
        // Arrange
        let aggregator = MockDirectoryAggregator::new();
        aggregator.publish(
            vec![ServerRecord {
                host: "a.example".to_string(),
                port: 1,
                name: "A".to_string(),
                source_host: "https://hub.example".to_string(),
                description: "short".to_string(),
                ..ServerRecord::default()
            }],
            Vec::new(),
        );
        let mut browser = browser(aggregator);

        // Act
        browser.tick();
        let snapshot = BrowserSnapshot::capture(&browser);

        // Assert
        assert_eq!(snapshot.options.len(), 1, "no LAN option without discovery");
        assert!(snapshot.options[0].active);
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].address, "a.example:1");
        assert_eq!(snapshot.entries[0].origin, "directory");
        assert_eq!(snapshot.entries[0].description, "short");
        assert_eq!(snapshot.entries[1].origin, "preset");
        assert_eq!(snapshot.status, None);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut browser = browser(MockDirectoryAggregator::new());
        browser.tick();

        let json = serde_json::to_value(BrowserSnapshot::capture(&browser)).unwrap();

        assert_eq!(json["active_index"], 0);
        assert_eq!(json["options"][0]["host"], "https://hub.example");
        assert_eq!(json["entries"][0]["source_host"], serde_json::Value::Null);
    }
}
