//! Blocking HTTP access to a community directory.
//!
//! [`DirectoryApi`] is the seam between the workers and the network: each
//! method performs one request and returns the raw response body, leaving
//! reply parsing to `community_core::protocol`.  [`HttpDirectoryApi`] is the
//! `reqwest::blocking` implementation; it must only be called from a worker
//! thread, never from the foreground loop.

use std::sync::OnceLock;
use std::time::Duration;

use community_core::protocol::messages::{
    AUTH_PATH, INFO_PATH, SERVERS_PATH, SERVER_DETAILS_SEGMENTS, USER_REGISTERED_PATH,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Transport-level failure of one directory request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed (TLS backend, proxy config).
    #[error("HTTP client could not be initialised: {0}")]
    ClientInit(String),

    /// The host plus path did not form a valid URL.
    #[error("invalid directory URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection error, timeout, or an unreadable body.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The directory answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl ApiError {
    /// Short machine-readable tag carried in `ok=false` replies.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ClientInit(_) => "client_init_failed",
            ApiError::InvalidUrl { .. } => community_core::protocol::INVALID_HOST,
            ApiError::Request { .. } | ApiError::Status { .. } => "request_failed",
        }
    }
}

/// Form body of `POST /api/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub passhash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,
}

/// One blocking call per directory endpoint.  `host` is already normalized.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryApi: Send + Sync {
    /// `GET {host}/api/user_registered?username=..`
    fn user_registered(&self, host: &str, username: &str) -> Result<String, ApiError>;
    /// `POST {host}/api/auth` with a urlencoded form.
    fn auth(&self, host: &str, form: &LoginForm) -> Result<String, ApiError>;
    /// `GET {host}/api/info`
    fn info(&self, host: &str) -> Result<String, ApiError>;
    /// `GET {host}/api/servers`
    fn servers(&self, host: &str) -> Result<String, ApiError>;
    /// `GET {host}/api/server/{code}` with `code` percent-encoded as one segment.
    fn server(&self, host: &str, code: &str) -> Result<String, ApiError>;
}

/// `reqwest::blocking` implementation of [`DirectoryApi`].
///
/// The client is built on first use so that construction happens on the
/// worker thread.  A construction failure is remembered and reported as
/// `client_init_failed` on every later call.
pub struct HttpDirectoryApi {
    timeout: Duration,
    user_agent: String,
    client: OnceLock<Result<Client, String>>,
}

impl HttpDirectoryApi {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&Client, ApiError> {
        let built = self.client.get_or_init(|| {
            Client::builder()
                .timeout(self.timeout)
                .user_agent(self.user_agent.clone())
                .build()
                .map_err(|e| e.to_string())
        });
        built
            .as_ref()
            .map_err(|reason| ApiError::ClientInit(reason.clone()))
    }

    fn send(&self, url: &Url, request: RequestBuilder) -> Result<String, ApiError> {
        debug!("HTTP request to {url}");
        let response = request.send().map_err(|e| ApiError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|e| ApiError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn get(&self, url: Url) -> Result<String, ApiError> {
        let request = self.client()?.get(url.clone());
        self.send(&url, request)
    }
}

impl DirectoryApi for HttpDirectoryApi {
    fn user_registered(&self, host: &str, username: &str) -> Result<String, ApiError> {
        let url = endpoint(host, USER_REGISTERED_PATH)?;
        let request = self.client()?.get(url.clone()).query(&[("username", username)]);
        self.send(&url, request)
    }

    fn auth(&self, host: &str, form: &LoginForm) -> Result<String, ApiError> {
        let url = endpoint(host, AUTH_PATH)?;
        let request = self.client()?.post(url.clone()).form(form);
        self.send(&url, request)
    }

    fn info(&self, host: &str) -> Result<String, ApiError> {
        self.get(endpoint(host, INFO_PATH)?)
    }

    fn servers(&self, host: &str) -> Result<String, ApiError> {
        self.get(endpoint(host, SERVERS_PATH)?)
    }

    fn server(&self, host: &str, code: &str) -> Result<String, ApiError> {
        self.get(server_details_url(host, code)?)
    }
}

// ── URL building ──────────────────────────────────────────────────────────────

/// Prefixes `http://` when the host carries no scheme.
fn base_url(host: &str) -> String {
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// `{host}{path}` as a parsed URL.
pub(crate) fn endpoint(host: &str, path: &str) -> Result<Url, ApiError> {
    let raw = format!("{}{path}", base_url(host));
    Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
        url: raw,
        reason: e.to_string(),
    })
}

/// `{host}/api/server/{code}`; `code` becomes a single encoded segment.
pub(crate) fn server_details_url(host: &str, code: &str) -> Result<Url, ApiError> {
    let raw = base_url(host);
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl {
            url: raw,
            reason: "host cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .extend(SERVER_DETAILS_SEGMENTS)
        .push(code);
    Ok(url)
}
