//! TOML-based configuration persistence for the server browser.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\CommunityBrowser\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/communitybrowser/config.toml` or
//!   `~/.config/communitybrowser/config.toml`
//! - macOS:    `~/Library/Application Support/CommunityBrowser/config.toml`
//!
//! ```toml
//! [browser]
//! lan_enabled = true
//! default_source = "LAN"
//!
//! [network]
//! http_timeout_secs = 5
//!
//! [[sources]]
//! host = "https://servers.example.org"
//! name = "Example"
//!
//! [[presets]]
//! host = "play.example.org"
//! port = 30000
//! ```
//!
//! Every section and field has a serde default, so an empty or partial file
//! loads cleanly and a missing file yields [`AppConfig::default`].
//!
//! # Arrays of tables (for beginners)
//!
//! A `[[sources]]` header starts one element of an array: each repetition of
//! the header appends another directory to `AppConfig::sources`.  Order in
//! the file is the order of the source options shown to the user, so adding
//! a directory appends a new `[[sources]]` block at the end and removing one
//! deletes its block.
//!
//! # Learned names
//!
//! A directory reports its own community name in `/api/info` replies and in
//! listings.  When that name differs from the saved one, the browser writes
//! it back as `community_name` on the matching `[[sources]]` block through
//! [`ConfigSourceStore`].  A hand-edited `name` is never overwritten; the
//! label shown prefers `community_name`, then `name`, then the raw host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use community_core::{DirectorySource, PresetServer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::browser::BrowserSettings;
use crate::application::ports::SourceStore;

/// Failure while locating, reading, or writing the browser config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `APPDATA`, `XDG_CONFIG_HOME`, nor `HOME` is set.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// Reading, writing, or creating the config directory failed.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// [`AppConfig`] could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Configured community directories, in display order.
    #[serde(default)]
    pub sources: Vec<DirectorySource>,
    /// Static servers appended after LAN and directory results.
    #[serde(default)]
    pub presets: Vec<PresetServer>,
}

/// Source selection and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserConfig {
    /// Whether the LAN option is offered at all.
    #[serde(default = "default_true")]
    pub lan_enabled: bool,
    /// `"LAN"`, a directory host, or empty for "LAN if enabled".
    #[serde(default)]
    pub default_source: String,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP client settings shared by every worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Per-call timeout; a timeout is reported like any transport failure.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_http_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    format!("community-browser/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            lan_enabled: default_true(),
            default_source: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Startup state for the orchestrator.
    pub fn browser_settings(&self) -> BrowserSettings {
        let default_source = Some(self.browser.default_source.trim().to_string())
            .filter(|s| !s.is_empty());
        BrowserSettings {
            lan_enabled: self.browser.lan_enabled,
            default_source,
            sources: self.sources.clone(),
            presets: self.presets.clone(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Directory holding `config.toml` on this platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Full path of `config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform path.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Persists `config` to the platform path.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            debug!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}; using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory plus the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("CommunityBrowser"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("communitybrowser"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("CommunityBrowser")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── SourceStore adapter ───────────────────────────────────────────────────────

/// Persists directory list changes by rewriting the whole config file.
#[derive(Debug)]
pub struct ConfigSourceStore {
    config: AppConfig,
    path: PathBuf,
}

impl ConfigSourceStore {
    pub fn new(config: AppConfig, path: PathBuf) -> Self {
        Self { config, path }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceStore for ConfigSourceStore {
    fn save_sources(&mut self, sources: &[DirectorySource]) -> Result<(), String> {
        let previous = std::mem::replace(&mut self.config.sources, sources.to_vec());
        match save_config_to(&self.config, &self.path) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("config write failed; keeping previous directory list: {e}");
                self.config.sources = previous;
                Err(e.to_string())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
