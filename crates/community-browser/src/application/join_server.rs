//! JoinServerUseCase: the login handshake that precedes a connection.
//!
//! A join is anonymous when no directory is involved.  Otherwise the flow
//! talks to the directory through the [`AuthService`] in zero, one, or two
//! round trips:
//!
//! ```text
//! Idle ──join──► connect anonymously                 (no directory host)
//!      ──join──► AwaitingAuth                        (stored hash, no password typed)
//!      ──join──► AwaitingAuth                        (password typed, salt cached)
//!      ──join──► AwaitingProbe                       (otherwise)
//!
//! AwaitingProbe ──probe reply──► Idle + message      (failed, locked, deleted,
//!                                                     no password, no salt)
//!                             ──► connect anonymously (not registered)
//!                             ──► AwaitingAuth        (registered, password, salt)
//!
//! AwaitingAuth  ──auth reply───► Idle + message      (failed)
//!                             ──► connect registered  (ok)
//! ```
//!
//! Only one join is pending at a time.  Starting a new one drops the old one
//! without waiting for it; any reply whose `(host, username)` does not match
//! the pending join is ignored.

use std::collections::HashMap;

use community_core::{
    hash_password, AuthReply, AuthResponse, BrowserEntry, LoginReply, ProbeReply,
};
use tracing::{debug, info};

use super::ports::{AuthService, ConnectRequest};
use super::status::StatusBanner;

pub const MSG_SELECT_SERVER: &str = "Select a server first.";
pub const MSG_ENTER_USERNAME: &str = "Enter a username to join this community.";
pub const MSG_UNREACHABLE: &str = "Failed to reach the community server.";
pub const MSG_LOCKED: &str = "This account is locked.";
pub const MSG_DELETED: &str = "This account has been deleted.";
pub const MSG_ENTER_PASSWORD: &str = "This username is registered. Enter your password.";
pub const MSG_MISSING_SALT: &str = "The community server did not send a salt for this account.";
pub const MSG_AUTH_FAILED: &str = "Authentication failed.";
pub const MSG_HASH_FAILED: &str = "Could not hash the password.";

/// Remembered hash for one account on one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub host: String,
    pub username: String,
    pub passhash: String,
}

impl StoredCredential {
    fn matches(&self, host: &str, username: &str) -> bool {
        self.host == host && self.username == username
    }
}

/// Salts seen during this session, keyed by `host + "\n" + username`.
///
/// Never persisted.
#[derive(Debug, Default)]
pub struct SaltCache {
    salts: HashMap<String, String>,
}

impl SaltCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host: &str, username: &str) -> Option<&str> {
        self.salts.get(&salt_key(host, username)).map(String::as_str)
    }

    pub fn insert(&mut self, host: &str, username: &str, salt: &str) {
        self.salts.insert(salt_key(host, username), salt.to_string());
    }

    pub fn len(&self) -> usize {
        self.salts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.salts.is_empty()
    }
}

fn salt_key(host: &str, username: &str) -> String {
    format!("{host}\n{username}")
}

/// The server, directory, and account a join is for.
#[derive(Debug, Clone)]
struct JoinTarget {
    entry: BrowserEntry,
    host: String,
    username: String,
}

impl JoinTarget {
    fn world(&self) -> Option<&str> {
        self.entry.world.as_deref()
    }
}

/// State of the single in-flight join.
#[derive(Debug, Default)]
enum JoinState {
    #[default]
    Idle,
    /// Waiting for `/api/user_registered`.  `password` may be empty.
    AwaitingProbe { target: JoinTarget, password: String },
    /// Waiting for `/api/auth`.  The password has been replaced by its hash.
    AwaitingAuth {
        target: JoinTarget,
        passhash: String,
        used_stored: bool,
    },
}

/// Result of feeding the flow a user action or a worker reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinUpdate {
    /// A request is in flight; nothing for the UI to do yet.
    Waiting,
    /// Terminal: open the connection.
    Connect(ConnectRequest),
    /// Terminal: show this banner.
    Failed(StatusBanner),
    /// The reply did not belong to the pending join.
    Ignored,
}

/// Drives the join state machine and owns the session's salt cache and
/// stored credential.
#[derive(Debug, Default)]
pub struct JoinFlow {
    state: JoinState,
    salts: SaltCache,
    stored: Option<StoredCredential>,
}

impl JoinFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while a probe or auth reply is awaited.
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, JoinState::Idle)
    }

    /// `true` while the pending join waits on `/api/auth`.
    pub fn is_awaiting_auth(&self) -> bool {
        matches!(self.state, JoinState::AwaitingAuth { .. })
    }

    pub fn salts(&self) -> &SaltCache {
        &self.salts
    }

    pub fn stored_credential(&self) -> Option<&StoredCredential> {
        self.stored.as_ref()
    }

    pub fn set_stored_credential(&mut self, credential: Option<StoredCredential>) {
        self.stored = credential;
    }

    /// Drops the pending join, if any.  Its reply will be ignored on arrival.
    pub fn cancel(&mut self) {
        if self.is_pending() {
            debug!("discarding pending join");
        }
        self.state = JoinState::Idle;
    }

    /// Starts a join for `entry`.
    ///
    /// `host` is the directory the join belongs to; `None` joins anonymously.
    pub fn start(
        &mut self,
        entry: BrowserEntry,
        host: Option<String>,
        username: &str,
        password: &str,
        auth: &mut dyn AuthService,
    ) -> JoinUpdate {
        self.cancel();
        let username = username.trim().to_string();

        let Some(host) = host else {
            info!("joining {} anonymously", entry.key());
            return JoinUpdate::Connect(anonymous(entry, username, None));
        };
        if username.is_empty() {
            return JoinUpdate::Failed(StatusBanner::warning(MSG_ENTER_USERNAME));
        }

        let target = JoinTarget {
            entry,
            host,
            username,
        };

        if password.is_empty() {
            let stored = self
                .stored
                .as_ref()
                .filter(|c| c.matches(&target.host, &target.username))
                .map(|c| c.passhash.clone());
            if let Some(passhash) = stored {
                debug!("using stored hash for {}", target.host);
                return self.send_auth(target, passhash, true, auth);
            }
        } else if let Some(salt) = self.salts.get(&target.host, &target.username) {
            debug!("salt cached for {}; skipping probe", target.host);
            return match hash_password(password, salt) {
                Ok(passhash) => self.send_auth(target, passhash, false, auth),
                Err(e) => JoinUpdate::Failed(StatusBanner::error(format!("{MSG_HASH_FAILED} {e}"))),
            };
        }

        debug!("probing {} for registration", target.host);
        auth.request_user_registered(&target.host, &target.username);
        self.state = JoinState::AwaitingProbe {
            target,
            password: password.to_string(),
        };
        JoinUpdate::Waiting
    }

    /// Feeds one worker reply into the state machine.
    pub fn handle_response(
        &mut self,
        response: AuthResponse,
        auth: &mut dyn AuthService,
    ) -> JoinUpdate {
        let pending = match &self.state {
            JoinState::Idle => None,
            JoinState::AwaitingProbe { target, .. } | JoinState::AwaitingAuth { target, .. } => {
                Some(target)
            }
        };
        let Some(target) = pending else {
            debug!("dropping auth reply from {}: no join pending", response.host);
            return JoinUpdate::Ignored;
        };
        if !response.matches(&target.host, &target.username) {
            debug!("dropping stale auth reply from {}", response.host);
            return JoinUpdate::Ignored;
        }

        match (std::mem::take(&mut self.state), response.reply) {
            (JoinState::AwaitingProbe { target, password }, AuthReply::Probe(reply)) => {
                self.on_probe(target, password, reply, auth)
            }
            (
                JoinState::AwaitingAuth {
                    target,
                    passhash,
                    used_stored,
                },
                AuthReply::Login(reply),
            ) => self.on_login(target, passhash, used_stored, reply),
            (state, _) => {
                debug!("dropping auth reply of the wrong kind from {}", response.host);
                self.state = state;
                JoinUpdate::Ignored
            }
        }
    }

    fn on_probe(
        &mut self,
        target: JoinTarget,
        password: String,
        reply: ProbeReply,
        auth: &mut dyn AuthService,
    ) -> JoinUpdate {
        if reply.ok && !reply.salt.is_empty() {
            self.salts.insert(&target.host, &target.username, &reply.salt);
        }

        if !reply.ok {
            info!("probe to {} failed: {}", target.host, reply.error);
            return JoinUpdate::Failed(StatusBanner::error(MSG_UNREACHABLE));
        }
        if reply.registered && reply.locked {
            return JoinUpdate::Failed(StatusBanner::error(MSG_LOCKED));
        }
        if reply.registered && reply.deleted {
            return JoinUpdate::Failed(StatusBanner::error(MSG_DELETED));
        }
        if !reply.registered {
            info!("{} is not registered on {}; joining anonymously", target.username, target.host);
            let JoinTarget {
                entry,
                host,
                username,
            } = target;
            return JoinUpdate::Connect(anonymous(entry, username, Some(host)));
        }
        if password.is_empty() {
            return JoinUpdate::Failed(StatusBanner::warning(MSG_ENTER_PASSWORD));
        }
        if reply.salt.is_empty() {
            return JoinUpdate::Failed(StatusBanner::error(MSG_MISSING_SALT));
        }

        match hash_password(&password, &reply.salt) {
            Ok(passhash) => self.send_auth(target, passhash, false, auth),
            Err(e) => JoinUpdate::Failed(StatusBanner::error(format!("{MSG_HASH_FAILED} {e}"))),
        }
    }

    fn on_login(
        &mut self,
        target: JoinTarget,
        passhash: String,
        used_stored: bool,
        reply: LoginReply,
    ) -> JoinUpdate {
        if !reply.ok {
            info!("authentication on {} failed: {}", target.host, reply.error);
            if used_stored {
                self.stored = None;
            }
            let message = if reply.error.is_empty() {
                MSG_AUTH_FAILED.to_string()
            } else {
                format!("{MSG_AUTH_FAILED} ({})", reply.error)
            };
            return JoinUpdate::Failed(StatusBanner::error(message));
        }

        info!("authenticated {} on {}", target.username, target.host);
        self.stored = Some(StoredCredential {
            host: target.host.clone(),
            username: target.username.clone(),
            passhash,
        });
        JoinUpdate::Connect(ConnectRequest {
            entry: target.entry,
            username: target.username,
            community_host: Some(target.host),
            registered: true,
            community_admin: reply.community_admin,
            local_admin: reply.local_admin,
        })
    }

    fn send_auth(
        &mut self,
        target: JoinTarget,
        passhash: String,
        used_stored: bool,
        auth: &mut dyn AuthService,
    ) -> JoinUpdate {
        auth.request_auth(&target.host, &target.username, &passhash, target.world());
        self.state = JoinState::AwaitingAuth {
            target,
            passhash,
            used_stored,
        };
        JoinUpdate::Waiting
    }
}

fn anonymous(entry: BrowserEntry, username: String, host: Option<String>) -> ConnectRequest {
    ConnectRequest {
        entry,
        username,
        community_host: host,
        registered: false,
        community_admin: false,
        local_admin: false,
    }
}
