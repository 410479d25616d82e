//! The details worker: `/api/info` reachability checks and long-form server
//! descriptions.  Same queue semantics as the auth worker, on its own thread
//! so a slow description fetch never delays a login.

use std::sync::Arc;

use community_core::protocol::INVALID_HOST;
use community_core::{normalize_host, DetailsRequest, DetailsResponse, DirectoryInfo, ServerDetails};
use tracing::{debug, warn};

use super::http_api::DirectoryApi;
use super::worker::BackgroundWorker;
use crate::application::ports::DetailsService;

/// [`DetailsService`] backed by a background thread.
pub struct DetailsWorker {
    worker: BackgroundWorker<DetailsRequest, DetailsResponse>,
}

impl DetailsWorker {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        let handler = move |request| process_details_request(api.as_ref(), request);
        Self {
            worker: BackgroundWorker::new("details-worker", handler, reject_details_request),
        }
    }

    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}

impl DetailsService for DetailsWorker {
    fn request_info(&mut self, host: &str) {
        self.worker.submit(DetailsRequest::Info {
            host: host.to_string(),
        });
    }

    fn request_server_details(&mut self, host: &str, code: &str) {
        self.worker.submit(DetailsRequest::Server {
            host: host.to_string(),
            code: code.to_string(),
        });
    }

    fn consume_response(&mut self) -> Option<DetailsResponse> {
        self.worker.try_recv()
    }
}

/// Performs one details request synchronously.  The host is echoed verbatim.
pub fn process_details_request(api: &dyn DirectoryApi, request: DetailsRequest) -> DetailsResponse {
    match request {
        DetailsRequest::Info { host: echo_host } => {
            let host = normalize_host(&echo_host);
            let info = if host.is_empty() {
                DirectoryInfo::failed(INVALID_HOST)
            } else {
                match api.info(&host) {
                    Ok(body) => DirectoryInfo::parse(&body)
                        .unwrap_or_else(|e| DirectoryInfo::failed(e.to_string())),
                    Err(e) => {
                        warn!("directory {host} unreachable: {e}");
                        DirectoryInfo::failed(e.code())
                    }
                }
            };
            DetailsResponse::Info {
                host: echo_host,
                info,
            }
        }
        DetailsRequest::Server {
            host: echo_host,
            code,
        } => {
            let host = normalize_host(&echo_host);
            let details = if host.is_empty() {
                ServerDetails::failed(INVALID_HOST)
            } else {
                match api.server(&host, &code) {
                    Ok(body) => ServerDetails::parse(&body)
                        .unwrap_or_else(|e| ServerDetails::failed(e.to_string())),
                    Err(e) => {
                        debug!("details for {code} on {host} failed: {e}");
                        ServerDetails::failed(e.code())
                    }
                }
            };
            DetailsResponse::Server {
                host: echo_host,
                code,
                details,
            }
        }
    }
}

fn reject_details_request(request: DetailsRequest, reason: &str) -> DetailsResponse {
    match request {
        DetailsRequest::Info { host } => DetailsResponse::Info {
            host,
            info: DirectoryInfo::failed(reason),
        },
        DetailsRequest::Server { host, code } => DetailsResponse::Server {
            host,
            code,
            details: ServerDetails::failed(reason),
        },
    }
}
