//! Network infrastructure for the server browser.
//!
//! # Sub-modules
//!
//! - **`http_api`** – The `DirectoryApi` seam and its `reqwest::blocking`
//!   implementation.  One method per directory endpoint; bodies are returned
//!   raw and parsed by the caller.
//!
//! - **`worker`** – A generic lazily started background thread with a request
//!   channel, a response channel, and a stop flag.
//!
//! - **`auth_worker`** – Registration probes and logins (`AuthService`).
//!
//! - **`details_worker`** – `/api/info` checks and long-form server
//!   descriptions (`DetailsService`).
//!
//! - **`aggregator`** – Polls every active directory's info and server
//!   listing (`DirectoryAggregator`).

pub mod aggregator;
pub mod auth_worker;
pub mod details_worker;
pub mod http_api;
pub mod worker;

pub use aggregator::HttpDirectoryAggregator;
pub use auth_worker::AuthWorker;
pub use details_worker::DetailsWorker;
pub use http_api::{ApiError, DirectoryApi, HttpDirectoryApi, LoginForm};
