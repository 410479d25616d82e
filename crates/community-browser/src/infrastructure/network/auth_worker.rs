//! The auth worker: registration probes and credentialed logins.
//!
//! Requests are served strictly in order on one background thread, so at most
//! one HTTP call is in flight.  Every request yields exactly one
//! [`AuthResponse`]; transport and parse failures become `ok=false` replies
//! with a short error tag instead of crossing the queue as errors.

use std::sync::Arc;

use community_core::protocol::INVALID_HOST;
use community_core::{normalize_host, AuthReply, AuthRequest, AuthResponse, LoginReply, ProbeReply};
use tracing::{debug, warn};

use super::http_api::{DirectoryApi, LoginForm};
use super::worker::BackgroundWorker;
use crate::application::ports::AuthService;

/// [`AuthService`] backed by a background thread.
pub struct AuthWorker {
    worker: BackgroundWorker<AuthRequest, AuthResponse>,
}

impl AuthWorker {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        let handler = move |request| process_auth_request(api.as_ref(), request);
        Self {
            worker: BackgroundWorker::new("auth-worker", handler, reject_auth_request),
        }
    }

    /// Stops the thread; queued requests are dropped unanswered.
    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}

impl AuthService for AuthWorker {
    fn request_user_registered(&mut self, host: &str, username: &str) {
        self.worker.submit(AuthRequest::Probe {
            host: host.to_string(),
            username: username.to_string(),
        });
    }

    fn request_auth(&mut self, host: &str, username: &str, passhash: &str, world: Option<&str>) {
        self.worker.submit(AuthRequest::Login {
            host: host.to_string(),
            username: username.to_string(),
            passhash: passhash.to_string(),
            world: world.map(str::to_string),
        });
    }

    fn consume_response(&mut self) -> Option<AuthResponse> {
        self.worker.try_recv()
    }
}

/// Performs one auth request synchronously.
///
/// The response echoes the request's host and username verbatim; the URL is
/// built from the normalized host, and an empty normalized host fails with
/// `invalid_host` without touching the network.
pub fn process_auth_request(api: &dyn DirectoryApi, request: AuthRequest) -> AuthResponse {
    let host = normalize_host(request.host());
    match request {
        AuthRequest::Probe {
            host: echo_host,
            username,
        } => {
            debug!("probing registration on {host}");
            let reply = if host.is_empty() {
                ProbeReply::failed(INVALID_HOST)
            } else {
                match api.user_registered(&host, &username) {
                    Ok(body) => ProbeReply::parse(&body).unwrap_or_else(|e| {
                        debug!("unreadable probe reply from {host}: {e}");
                        ProbeReply::failed(e.to_string())
                    }),
                    Err(e) => {
                        warn!("probe to {host} failed: {e}");
                        ProbeReply::failed(e.code())
                    }
                }
            };
            AuthResponse {
                host: echo_host,
                username,
                reply: AuthReply::Probe(reply),
            }
        }
        AuthRequest::Login {
            host: echo_host,
            username,
            passhash,
            world,
        } => {
            debug!("authenticating on {host}");
            let reply = if host.is_empty() {
                LoginReply::failed(INVALID_HOST)
            } else {
                let form = LoginForm {
                    username: username.clone(),
                    passhash,
                    world,
                };
                match api.auth(&host, &form) {
                    Ok(body) => LoginReply::parse(&body).unwrap_or_else(|e| {
                        debug!("unreadable auth reply from {host}: {e}");
                        LoginReply::failed(e.to_string())
                    }),
                    Err(e) => {
                        warn!("auth on {host} failed: {e}");
                        LoginReply::failed(e.code())
                    }
                }
            };
            AuthResponse {
                host: echo_host,
                username,
                reply: AuthReply::Login(reply),
            }
        }
    }
}

fn reject_auth_request(request: AuthRequest, reason: &str) -> AuthResponse {
    match request {
        AuthRequest::Probe { host, username } => AuthResponse {
            host,
            username,
            reply: AuthReply::Probe(ProbeReply::failed(reason)),
        },
        AuthRequest::Login { host, username, .. } => AuthResponse {
            host,
            username,
            reply: AuthReply::Login(LoginReply::failed(reason)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::http_api::{ApiError, MockDirectoryApi};
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn probe(host: &str) -> AuthRequest {
        AuthRequest::Probe {
            host: host.to_string(),
            username: "sam".to_string(),
        }
    }

    fn probe_reply(response: AuthResponse) -> ProbeReply {
        match response.reply {
            AuthReply::Probe(reply) => reply,
            other => panic!("expected probe reply, got {other:?}"),
        }
    }

    fn login_reply(response: AuthResponse) -> LoginReply {
        match response.reply {
            AuthReply::Login(reply) => reply,
            other => panic!("expected login reply, got {other:?}"),
        }
    }

    #[test]
    fn test_probe_parses_registration_fields() {
        // Arrange
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered()
            .with(eq("https://hub.example"), eq("sam"))
            .times(1)
            .returning(|_, _| {
                Ok(r#"{"ok":true,"registered":true,"salt":"abc","community_name":"Hub"}"#.into())
            });

        // Act
        let response = process_auth_request(&api, probe("https://hub.example//"));

        // Assert
        assert_eq!(response.host, "https://hub.example//", "host is echoed verbatim");
        let reply = probe_reply(response);
        assert!(reply.ok && reply.registered);
        assert_eq!(reply.salt, "abc");
        assert_eq!(reply.community_name, "Hub");
    }

    #[test]
    fn test_empty_host_is_rejected_without_a_request() {
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered().times(0);

        let reply = probe_reply(process_auth_request(&api, probe(" /// ")));

        assert!(!reply.ok);
        assert_eq!(reply.error, INVALID_HOST);
    }

    #[test]
    fn test_transport_failure_becomes_request_failed() {
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered().returning(|_, _| {
            Err(ApiError::Request {
                url: "https://hub.example/api/user_registered".into(),
                reason: "connection refused".into(),
            })
        });

        let reply = probe_reply(process_auth_request(&api, probe("https://hub.example")));

        assert!(!reply.ok);
        assert_eq!(reply.error, "request_failed");
    }

    #[test]
    fn test_malformed_body_becomes_failed_reply() {
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered()
            .returning(|_, _| Ok("<html>oops</html>".into()));

        let reply = probe_reply(process_auth_request(&api, probe("https://hub.example")));

        assert!(!reply.ok);
        assert!(!reply.error.is_empty());
        assert!(!reply.registered);
    }

    #[test]
    fn test_login_sends_form_with_world() {
        // Arrange
        let mut api = MockDirectoryApi::new();
        api.expect_auth()
            .withf(|host, form| {
                host == "https://hub.example"
                    && form.username == "sam"
                    && form.passhash == "beef"
                    && form.world.as_deref() == Some("alpha")
            })
            .times(1)
            .returning(|_, _| Ok(r#"{"ok":true,"local_admin":true}"#.into()));

        // Act
        let response = process_auth_request(
            &api,
            AuthRequest::Login {
                host: "https://hub.example".to_string(),
                username: "sam".to_string(),
                passhash: "beef".to_string(),
                world: Some("alpha".to_string()),
            },
        );

        // Assert
        let reply = login_reply(response);
        assert!(reply.ok);
        assert!(reply.local_admin);
        assert!(!reply.community_admin);
    }

    #[test]
    fn test_http_status_failure_on_login() {
        let mut api = MockDirectoryApi::new();
        api.expect_auth().returning(|_, _| {
            Err(ApiError::Status {
                url: "https://hub.example/api/auth".into(),
                status: 503,
            })
        });

        let reply = login_reply(process_auth_request(
            &api,
            AuthRequest::Login {
                host: "https://hub.example".to_string(),
                username: "sam".to_string(),
                passhash: "beef".to_string(),
                world: None,
            },
        ));

        assert!(!reply.ok);
        assert_eq!(reply.error, "request_failed");
    }

    #[test]
    fn test_worker_answers_through_response_queue() {
        // Arrange
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered()
            .returning(|_, _| Ok(r#"{"ok":true,"registered":false}"#.into()));
        let mut worker = AuthWorker::new(Arc::new(api));

        // Act
        worker.request_user_registered("https://hub.example", "sam");
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut response = None;
        while response.is_none() && Instant::now() < deadline {
            response = worker.consume_response();
            std::thread::sleep(Duration::from_millis(5));
        }

        // Assert
        let response = response.expect("response within deadline");
        assert!(response.matches("https://hub.example", "sam"));
        assert!(response.reply.ok());
        assert_eq!(worker.consume_response(), None);
        assert_eq!(worker.consume_response(), None);
        worker.shutdown();
    }

    #[test]
    fn test_shutdown_drops_queued_requests_without_replies() {
        // Arrange: each call is slow enough that the second is still queued.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut api = MockDirectoryApi::new();
        api.expect_user_registered().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            Ok(r#"{"ok":true,"registered":false}"#.into())
        });
        let mut worker = AuthWorker::new(Arc::new(api));
        worker.request_user_registered("https://hub.example", "sam");
        worker.request_user_registered("https://hub.example", "alex");

        // Act
        worker.shutdown();

        // Assert
        assert!(calls.load(Ordering::SeqCst) <= 1);
        assert_eq!(worker.consume_response(), None);
        assert_eq!(worker.consume_response(), None);
    }

    #[test]
    fn test_rejected_request_keeps_kind_and_identity() {
        let response = reject_auth_request(probe("https://hub.example"), "worker_unavailable");
        assert!(response.matches("https://hub.example", "sam"));
        assert_eq!(probe_reply(response).error, "worker_unavailable");
    }
}
