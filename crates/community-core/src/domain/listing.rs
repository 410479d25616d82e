//! Server listings and the merged browser entry list.
//!
//! Two producers feed the browser: LAN broadcast discovery ([`LanServer`]) and
//! remote directories ([`ServerRecord`]).  Configured presets
//! ([`PresetServer`]) are appended last.  [`merge_entries`] folds them into a
//! single list of [`BrowserEntry`] values with at most one entry per
//! `host:port`.
//!
//! # Tie-break
//!
//! Insertion order decides who wins a duplicate key: LAN records are inserted
//! first, remote records second, presets last.  A server that answers a LAN
//! broadcast and is also listed by a directory is therefore shown once, as LAN.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A server as published by a remote directory.
///
/// Replaced wholesale whenever the aggregator's generation counter advances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Opaque identifier assigned by the directory.
    pub code: String,
    pub game_mode: String,
    pub active_players: u32,
    pub max_players: u32,
    pub flags: Vec<String>,
    /// Normalized host of the directory that listed this server.
    pub source_host: String,
    /// Community name the directory reported, if any.
    pub source_name: String,
    pub screenshot_id: String,
    /// Short description from the listing; the long form is fetched lazily.
    pub description: String,
}

/// A server found by LAN broadcast discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanServer {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub world: String,
    /// Host as it should be shown to the user (may differ from `host`).
    pub display_host: String,
}

/// A statically configured server.  Joins to presets are always anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetServer {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub name: String,
}

/// Health of one directory source as seen by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStatus {
    pub source_host: String,
    pub ok: bool,
    pub active_count: u32,
    pub inactive_count: u32,
    pub community_name: String,
    pub community_details: String,
}

/// Where a browser entry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOrigin {
    Lan,
    Directory {
        source_host: String,
        source_name: String,
        code: String,
        screenshot_id: String,
    },
    Preset,
}

/// UI-ready projection of a LAN server, a directory record, or a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEntry {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub display_host: String,
    pub description: String,
    pub game_mode: String,
    pub active_players: u32,
    pub max_players: u32,
    pub flags: Vec<String>,
    /// World name, known only for LAN servers.
    pub world: Option<String>,
    pub origin: EntryOrigin,
}

impl BrowserEntry {
    /// De-duplication key: `host:port`.
    pub fn key(&self) -> String {
        entry_key(&self.host, self.port)
    }

    pub fn is_lan(&self) -> bool {
        matches!(self.origin, EntryOrigin::Lan)
    }

    pub fn is_preset(&self) -> bool {
        matches!(self.origin, EntryOrigin::Preset)
    }

    /// Directory host this entry was listed by, when it came from aggregation.
    pub fn source_host(&self) -> Option<&str> {
        match &self.origin {
            EntryOrigin::Directory { source_host, .. } if !source_host.is_empty() => {
                Some(source_host)
            }
            _ => None,
        }
    }

    /// `(source_host, code)` pair used to look up the long-form description.
    pub fn description_key(&self) -> Option<(&str, &str)> {
        match &self.origin {
            EntryOrigin::Directory {
                source_host, code, ..
            } if !source_host.is_empty() && !code.is_empty() => Some((source_host, code)),
            _ => None,
        }
    }
}

impl From<&LanServer> for BrowserEntry {
    fn from(server: &LanServer) -> Self {
        let display_host = if server.display_host.is_empty() {
            server.host.clone()
        } else {
            server.display_host.clone()
        };
        Self {
            host: server.host.clone(),
            port: server.port,
            name: server.name.clone(),
            display_host,
            description: String::new(),
            game_mode: String::new(),
            active_players: 0,
            max_players: 0,
            flags: Vec::new(),
            world: Some(server.world.clone()).filter(|w| !w.is_empty()),
            origin: EntryOrigin::Lan,
        }
    }
}

impl From<&ServerRecord> for BrowserEntry {
    fn from(record: &ServerRecord) -> Self {
        Self {
            host: record.host.clone(),
            port: record.port,
            name: record.name.clone(),
            display_host: record.host.clone(),
            description: record.description.clone(),
            game_mode: record.game_mode.clone(),
            active_players: record.active_players,
            max_players: record.max_players,
            flags: record.flags.clone(),
            world: None,
            origin: EntryOrigin::Directory {
                source_host: record.source_host.clone(),
                source_name: record.source_name.clone(),
                code: record.code.clone(),
                screenshot_id: record.screenshot_id.clone(),
            },
        }
    }
}

impl From<&PresetServer> for BrowserEntry {
    fn from(preset: &PresetServer) -> Self {
        let name = if preset.name.is_empty() {
            entry_key(&preset.host, preset.port)
        } else {
            preset.name.clone()
        };
        Self {
            host: preset.host.clone(),
            port: preset.port,
            name,
            display_host: preset.host.clone(),
            description: String::new(),
            game_mode: String::new(),
            active_players: 0,
            max_players: 0,
            flags: Vec::new(),
            world: None,
            origin: EntryOrigin::Preset,
        }
    }
}

/// Builds the `host:port` de-duplication key.
pub fn entry_key(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

/// Rebuilds the full entry list from its three producers.
///
/// `lan` is `None` when LAN is not the active source; those records are then
/// skipped entirely.  The result never contains two entries with the same
/// [`entry_key`].
pub fn merge_entries(
    lan: Option<&[LanServer]>,
    remote: &[ServerRecord],
    presets: &[PresetServer],
) -> Vec<BrowserEntry> {
    let capacity = lan.map_or(0, <[LanServer]>::len) + remote.len() + presets.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(capacity);
    let mut entries = Vec::with_capacity(capacity);

    let lan_entries = lan.unwrap_or_default().iter().map(BrowserEntry::from);
    let remote_entries = remote.iter().map(BrowserEntry::from);
    let preset_entries = presets.iter().map(BrowserEntry::from);

    for entry in lan_entries.chain(remote_entries).chain(preset_entries) {
        if seen.insert(entry.key()) {
            entries.push(entry);
        }
    }
    entries
}
