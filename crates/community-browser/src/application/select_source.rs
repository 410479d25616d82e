//! SelectSourceUseCase: the configured directories and which one is active.
//!
//! The catalog owns the in-memory copy of the directory list and the option
//! list derived from it (LAN first, then one option per directory).  Every
//! mutation that must survive a restart is committed through the
//! [`SourceStore`]; when the store fails, the in-memory change is reverted so
//! memory and configuration never disagree.
//!
//! # Persist-or-rollback (for beginners)
//!
//! Each mutation follows the same three steps:
//!
//! 1. Change the in-memory list (append, remove, or set a learned name).
//! 2. Ask the store to write the whole list.
//! 3. On failure, undo step 1 and report it: `add` and `remove` return
//!    [`SourceError::Persist`], `learn_name` returns `false`.
//!
//! Options are rebuilt from the list only after step 2 succeeds, so a label
//! never shows a name that the config file does not hold.

use community_core::{
    build_options, default_option_index, normalize_host, DirectorySource, SourceOption,
};
use thiserror::Error;
use tracing::{debug, warn};

use super::ports::SourceStore;

/// Errors returned by catalog mutations.
#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error("directory host is empty")]
    InvalidHost,
    #[error("directory {0} is already configured")]
    Duplicate(String),
    #[error("the LAN option cannot be removed")]
    CannotRemoveLan,
    #[error("no source option at index {0}")]
    OutOfRange(usize),
    #[error("could not save configuration: {0}")]
    Persist(String),
}

/// Configured directories plus the active selection.
#[derive(Debug)]
pub struct SourceCatalog {
    sources: Vec<DirectorySource>,
    lan_enabled: bool,
    default_source: Option<String>,
    options: Vec<SourceOption>,
    active: usize,
}

impl SourceCatalog {
    /// Builds the catalog and applies the default-selection rule.
    ///
    /// Hosts are normalized; sources with an empty host and later duplicates
    /// are dropped.
    pub fn new(
        sources: Vec<DirectorySource>,
        lan_enabled: bool,
        default_source: Option<String>,
    ) -> Self {
        let mut unique: Vec<DirectorySource> = Vec::with_capacity(sources.len());
        for mut source in sources {
            source.host = normalize_host(&source.host);
            if source.host.is_empty() || unique.iter().any(|s| s.host == source.host) {
                warn!("ignoring invalid or duplicate directory {:?}", source.host);
                continue;
            }
            unique.push(source);
        }

        let options = build_options(lan_enabled, &unique);
        let active = default_option_index(&options, default_source.as_deref());
        Self {
            sources: unique,
            lan_enabled,
            default_source,
            options,
            active,
        }
    }

    pub fn options(&self) -> &[SourceOption] {
        &self.options
    }

    pub fn sources(&self) -> &[DirectorySource] {
        &self.sources
    }

    pub fn lan_enabled(&self) -> bool {
        self.lan_enabled
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_option(&self) -> Option<&SourceOption> {
        self.options.get(self.active)
    }

    /// `true` when the LAN option is the active one.
    pub fn is_lan_active(&self) -> bool {
        self.active_option().is_some_and(SourceOption::is_lan)
    }

    /// Host of the active directory, `None` when LAN (or nothing) is active.
    pub fn active_host(&self) -> Option<&str> {
        self.active_option().and_then(SourceOption::host)
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.sources.iter().any(|s| s.host == host)
    }

    /// Makes `index` the active option.  Returns `true` if the selection changed.
    pub fn select(&mut self, index: usize) -> Result<bool, SourceError> {
        if index >= self.options.len() {
            return Err(SourceError::OutOfRange(index));
        }
        let changed = index != self.active;
        self.active = index;
        Ok(changed)
    }

    /// Adds a directory and persists the new list.
    ///
    /// Returns the option index of the new source.
    pub fn add(
        &mut self,
        host: &str,
        display_name: &str,
        store: &mut dyn SourceStore,
    ) -> Result<usize, SourceError> {
        let source = DirectorySource::new(host, display_name);
        if source.host.is_empty() {
            return Err(SourceError::InvalidHost);
        }
        if self.contains_host(&source.host) {
            return Err(SourceError::Duplicate(source.host));
        }

        self.sources.push(source);
        if let Err(reason) = store.save_sources(&self.sources) {
            self.sources.pop();
            warn!("failed to persist new directory, rolled back: {reason}");
            return Err(SourceError::Persist(reason));
        }
        self.rebuild_options();
        Ok(self.options.len() - 1)
    }

    /// Removes the directory shown at option `index` and persists the new list.
    pub fn remove(
        &mut self,
        index: usize,
        store: &mut dyn SourceStore,
    ) -> Result<DirectorySource, SourceError> {
        let host = match self.options.get(index) {
            None => return Err(SourceError::OutOfRange(index)),
            Some(SourceOption::Lan) => return Err(SourceError::CannotRemoveLan),
            Some(SourceOption::Remote { host, .. }) => host.clone(),
        };
        let position = self
            .sources
            .iter()
            .position(|s| s.host == host)
            .ok_or(SourceError::OutOfRange(index))?;

        let removed = self.sources.remove(position);
        if let Err(reason) = store.save_sources(&self.sources) {
            self.sources.insert(position, removed);
            warn!("failed to persist directory removal, rolled back: {reason}");
            return Err(SourceError::Persist(reason));
        }

        let was_active = index == self.active;
        if index < self.active {
            self.active -= 1;
        }
        self.rebuild_options();
        if was_active {
            self.active = default_option_index(&self.options, self.default_source.as_deref());
        }
        Ok(removed)
    }

    /// Records the community name a directory reported for itself.
    ///
    /// Unknown hosts and empty names are ignored.  Returns `true` if the name
    /// changed and was persisted; a failed persist restores the previous name.
    pub fn learn_name(&mut self, host: &str, name: &str, store: &mut dyn SourceStore) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(position) = self.sources.iter().position(|s| s.host == host) else {
            return false;
        };
        if self.sources[position].community_name.as_deref() == Some(name) {
            return false;
        }

        let previous = self.sources[position]
            .community_name
            .replace(name.to_string());
        if let Err(reason) = store.save_sources(&self.sources) {
            self.sources[position].community_name = previous;
            warn!("failed to persist community name for {host}, rolled back: {reason}");
            return false;
        }
        debug!("learned community name {name:?} for {host}");
        self.rebuild_options();
        true
    }

    /// Regenerates option labels; re-applies the default rule when the
    /// active index fell out of range.
    fn rebuild_options(&mut self) {
        self.options = build_options(self.lan_enabled, &self.sources);
        if self.active >= self.options.len() {
            self.active = default_option_index(&self.options, self.default_source.as_deref());
        }
    }
}
