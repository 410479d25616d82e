//! Request and response types exchanged with the background workers.
//!
//! Both unions are closed: each variant carries only the fields its
//! request kind needs.  Every response echoes the `host` (and, for auth,
//! the `username`) it answers so the orchestrator can discard stale replies.

use crate::protocol::replies::{DirectoryInfo, LoginReply, ProbeReply, ServerDetails};

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// `GET`, query `username`.
pub const USER_REGISTERED_PATH: &str = "/api/user_registered";
/// `POST`, form `username`, `passhash`, optional `world`.
pub const AUTH_PATH: &str = "/api/auth";
/// `GET`, reachability probe and community metadata.
pub const INFO_PATH: &str = "/api/info";
/// `GET`, server listing consumed by the HTTP aggregator.
pub const SERVERS_PATH: &str = "/api/servers";
/// Path segments of `GET /api/server/{code}`; the code is appended as its own
/// percent-encoded segment.
pub const SERVER_DETAILS_SEGMENTS: [&str; 2] = ["api", "server"];

// ── Auth worker ───────────────────────────────────────────────────────────────

/// A request handled by the auth worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    /// "Is this username registered?"  Does not authenticate.
    Probe { host: String, username: String },
    /// Credentialed login with a derived password hash.
    Login {
        host: String,
        username: String,
        passhash: String,
        world: Option<String>,
    },
}

impl AuthRequest {
    pub fn host(&self) -> &str {
        match self {
            AuthRequest::Probe { host, .. } | AuthRequest::Login { host, .. } => host,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            AuthRequest::Probe { username, .. } | AuthRequest::Login { username, .. } => username,
        }
    }
}

/// Outcome of an [`AuthRequest`], tagged by request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthReply {
    Probe(ProbeReply),
    Login(LoginReply),
}

impl AuthReply {
    pub fn ok(&self) -> bool {
        match self {
            AuthReply::Probe(reply) => reply.ok,
            AuthReply::Login(reply) => reply.ok,
        }
    }
}

/// A worker answer.  Always produced, whatever the transport outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub host: String,
    pub username: String,
    pub reply: AuthReply,
}

impl AuthResponse {
    /// Returns `true` if this response answers a request for `host`/`username`.
    pub fn matches(&self, host: &str, username: &str) -> bool {
        self.host == host && self.username == username
    }
}

// ── Details worker ────────────────────────────────────────────────────────────

/// A request handled by the details worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsRequest {
    /// `GET /api/info` on a directory.
    Info { host: String },
    /// `GET /api/server/{code}` on a directory.
    Server { host: String, code: String },
}

/// Outcome of a [`DetailsRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsResponse {
    Info { host: String, info: DirectoryInfo },
    Server {
        host: String,
        code: String,
        details: ServerDetails,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_request_accessors_cover_both_kinds() {
        let probe = AuthRequest::Probe {
            host: "https://a.example".to_string(),
            username: "sam".to_string(),
        };
        let login = AuthRequest::Login {
            host: "https://b.example".to_string(),
            username: "kim".to_string(),
            passhash: "00".to_string(),
            world: None,
        };
        assert_eq!(probe.host(), "https://a.example");
        assert_eq!(probe.username(), "sam");
        assert_eq!(login.host(), "https://b.example");
        assert_eq!(login.username(), "kim");
    }

    #[test]
    fn test_auth_response_matches_requires_host_and_username() {
        let response = AuthResponse {
            host: "https://a.example".to_string(),
            username: "sam".to_string(),
            reply: AuthReply::Probe(ProbeReply::failed("request_failed")),
        };
        assert!(response.matches("https://a.example", "sam"));
        assert!(!response.matches("https://a.example", "kim"));
        assert!(!response.matches("https://b.example", "sam"));
        assert!(!response.reply.ok());
    }
}
