//! HTTP directory aggregator: polls `/api/info` and `/api/servers` on every
//! configured directory from a background thread.
//!
//! One refresh fetches all hosts sequentially and is published as a whole; the
//! generation counter advances once per published refresh (and once when
//! `set_sources` drops records from hosts no longer polled).  A refresh asked
//! for while one is running is coalesced into a single follow-up.

use std::sync::Arc;

use community_core::protocol::parse_server_listing;
use community_core::{normalize_host, DirectoryInfo, ServerRecord, SourceStatus};
use tracing::{debug, warn};

use super::http_api::DirectoryApi;
use super::worker::BackgroundWorker;
use crate::application::ports::DirectoryAggregator;

/// Result of one full refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshResult {
    /// Hosts the refresh was started for.
    pub hosts: Vec<String>,
    pub servers: Vec<ServerRecord>,
    pub statuses: Vec<SourceStatus>,
}

/// [`DirectoryAggregator`] backed by a background thread.
pub struct HttpDirectoryAggregator {
    worker: BackgroundWorker<Vec<String>, RefreshResult>,
    sources: Vec<String>,
    in_flight: bool,
    follow_up: bool,
    generation: u64,
    servers: Vec<ServerRecord>,
    statuses: Vec<SourceStatus>,
}

impl HttpDirectoryAggregator {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        let handler = move |hosts: Vec<String>| fetch_all(api.as_ref(), hosts);
        Self {
            worker: BackgroundWorker::new("directory-aggregator", handler, reject_refresh),
            sources: Vec::new(),
            in_flight: false,
            follow_up: false,
            generation: 0,
            servers: Vec::new(),
            statuses: Vec::new(),
        }
    }

    pub fn shutdown(&mut self) {
        self.worker.shutdown();
        self.in_flight = false;
    }

    fn publish(&mut self, result: RefreshResult) {
        let sources = &self.sources;
        self.servers = result
            .servers
            .into_iter()
            .filter(|r| sources.contains(&r.source_host))
            .collect();
        self.statuses = result
            .statuses
            .into_iter()
            .filter(|s| sources.contains(&s.source_host))
            .collect();
        self.generation += 1;
        debug!(
            "directory refresh published: {} servers from {} hosts (generation {})",
            self.servers.len(),
            result.hosts.len(),
            self.generation
        );
    }
}

impl DirectoryAggregator for HttpDirectoryAggregator {
    fn set_sources(&mut self, hosts: Vec<String>) {
        let hosts: Vec<String> = hosts
            .iter()
            .map(|h| normalize_host(h))
            .filter(|h| !h.is_empty())
            .collect();
        if hosts == self.sources {
            return;
        }
        self.sources = hosts;

        let before = (self.servers.len(), self.statuses.len());
        let sources = &self.sources;
        self.servers.retain(|r| sources.contains(&r.source_host));
        self.statuses.retain(|s| sources.contains(&s.source_host));
        if before != (self.servers.len(), self.statuses.len()) {
            self.generation += 1;
        }
    }

    fn request_refresh(&mut self) {
        if self.sources.is_empty() {
            return;
        }
        if self.in_flight {
            self.follow_up = true;
            return;
        }
        debug!("refreshing {} directories", self.sources.len());
        self.worker.submit(self.sources.clone());
        self.in_flight = true;
    }

    fn update(&mut self) {
        while let Some(result) = self.worker.try_recv() {
            self.in_flight = false;
            self.publish(result);
        }
        if !self.in_flight && self.follow_up {
            self.follow_up = false;
            self.request_refresh();
        }
    }

    fn is_fetching(&self) -> bool {
        self.in_flight
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn servers(&self) -> Vec<ServerRecord> {
        self.servers.clone()
    }

    fn source_statuses(&self) -> Vec<SourceStatus> {
        self.statuses.clone()
    }
}

/// Fetches every host in order.  Runs on the worker thread.
pub fn fetch_all(api: &dyn DirectoryApi, hosts: Vec<String>) -> RefreshResult {
    let mut servers = Vec::new();
    let mut statuses = Vec::with_capacity(hosts.len());

    for host in &hosts {
        let info = match api.info(host) {
            Ok(body) => DirectoryInfo::parse(&body)
                .unwrap_or_else(|e| DirectoryInfo::failed(e.to_string())),
            Err(e) => DirectoryInfo::failed(e.code()),
        };

        let listing = api
            .servers(host)
            .map_err(|e| e.to_string())
            .and_then(|body| {
                parse_server_listing(&body, host, &info.community_name).map_err(|e| e.to_string())
            });

        let mut status = SourceStatus {
            source_host: host.clone(),
            community_name: info.community_name.clone(),
            community_details: info.details.clone(),
            ..SourceStatus::default()
        };
        match listing {
            Ok(records) => {
                status.ok = true;
                status.active_count =
                    u32::try_from(records.iter().filter(|r| r.active_players > 0).count())
                        .unwrap_or(u32::MAX);
                status.inactive_count =
                    u32::try_from(records.len()).unwrap_or(u32::MAX) - status.active_count;
                servers.extend(records);
            }
            Err(reason) => warn!("listing from {host} failed: {reason}"),
        }
        statuses.push(status);
    }

    RefreshResult {
        hosts,
        servers,
        statuses,
    }
}

fn reject_refresh(hosts: Vec<String>, _reason: &str) -> RefreshResult {
    RefreshResult {
        hosts,
        ..RefreshResult::default()
    }
}
