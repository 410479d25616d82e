//! Directory sources: the remote community directories a user has configured.
//!
//! A source is identified by its normalized host (no surrounding whitespace,
//! no trailing slashes).  The browser also offers a distinguished "LAN" option
//! that has no host at all; it is modelled by [`SourceOption::Lan`].

use serde::{Deserialize, Serialize};

/// Tokens accepted (case-insensitive, trimmed) as "the LAN option" when they
/// appear as the configured default source.
const LAN_TOKENS: [&str; 2] = ["LAN", "Local Area Network"];

/// Label shown for the LAN option.
pub const LAN_LABEL: &str = "Local Area Network";

/// A configured remote directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySource {
    /// Base URL of the directory, normalized by [`normalize_host`].
    pub host: String,
    /// Name the user assigned when adding the source.  May be empty.
    #[serde(default, rename = "name")]
    pub display_name: String,
    /// Name the directory reported for itself, learned while browsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_name: Option<String>,
}

impl DirectorySource {
    /// Creates a source with a normalized host and no learned name.
    pub fn new(host: &str, display_name: &str) -> Self {
        Self {
            host: normalize_host(host),
            display_name: display_name.trim().to_string(),
            community_name: None,
        }
    }

    /// Best-known label: remote-reported community name, then the
    /// user-assigned name, then the raw host.
    pub fn label(&self) -> &str {
        match self.community_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.display_name.trim().is_empty() => &self.display_name,
            _ => &self.host,
        }
    }
}

/// One entry in the browser's source selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOption {
    /// LAN broadcast discovery.
    Lan,
    /// A configured remote directory.
    Remote { host: String, label: String },
}

impl SourceOption {
    /// Text shown in the selector.
    pub fn label(&self) -> &str {
        match self {
            SourceOption::Lan => LAN_LABEL,
            SourceOption::Remote { label, .. } => label,
        }
    }

    /// Directory host for remote options, `None` for LAN.
    pub fn host(&self) -> Option<&str> {
        match self {
            SourceOption::Lan => None,
            SourceOption::Remote { host, .. } => Some(host),
        }
    }

    pub fn is_lan(&self) -> bool {
        matches!(self, SourceOption::Lan)
    }
}

/// Strips surrounding whitespace and any trailing slashes from a directory host.
///
/// Returns an empty string when nothing is left; callers treat that as an
/// invalid host.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

/// Returns `true` if `value` names the LAN option ("LAN" or
/// "Local Area Network", case-insensitive, surrounding whitespace ignored).
pub fn is_lan_token(value: &str) -> bool {
    let value = value.trim();
    LAN_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
}

/// Builds the ordered option list: LAN first (when enabled), then one option
/// per configured source in configuration order.
pub fn build_options(lan_enabled: bool, sources: &[DirectorySource]) -> Vec<SourceOption> {
    let mut options = Vec::with_capacity(sources.len() + 1);
    if lan_enabled {
        options.push(SourceOption::Lan);
    }
    options.extend(sources.iter().map(|source| SourceOption::Remote {
        host: source.host.clone(),
        label: source.label().to_string(),
    }));
    options
}

/// Picks the option index to activate when none is valid.
///
/// - A default naming the LAN token, or no default at all with LAN enabled,
///   selects LAN.
/// - Otherwise the configured source whose host matches the default wins.
/// - Otherwise index 0.
pub fn default_option_index(options: &[SourceOption], default_source: Option<&str>) -> usize {
    let lan_index = options.iter().position(SourceOption::is_lan);
    let default = default_source.map(str::trim).filter(|s| !s.is_empty());

    match default {
        Some(name) if is_lan_token(name) => lan_index.unwrap_or(0),
        None => lan_index.unwrap_or(0),
        Some(name) => {
            let wanted = normalize_host(name);
            options
                .iter()
                .position(|option| option.host() == Some(wanted.as_str()))
                .unwrap_or(0)
        }
    }
}
