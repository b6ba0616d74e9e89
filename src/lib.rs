//! # reqscope
//!
//! Scoped cancellation, bounded retries and named interceptors on top of
//! `reqwest`.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Named scopes**: every request is issued under a scope name; cancelling
//!   the scope aborts all of its in-flight requests at once.
//! - **Interceptors**: named request interceptors mutate the outgoing config,
//!   named response interceptors observe every outcome.
//! - **Retries**: `*_retry` variants re-issue a failed request a bounded number
//!   of times and never retry a cancellation.
//! - **Pluggable transports**: one [`ScopedClient`] over any [`Transport`];
//!   three reqwest-backed transports ship with the crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqscope::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = std::sync::Arc::new(FetchClient::default());
//!
//!     let worker = client.clone();
//!     let pending = tokio::spawn(async move {
//!         worker.get("search", "https://example.com/?q=rust", None).await
//!     });
//!
//!     // wait until the request is in flight under its scope
//!     while !client.scopes().iter().any(|s| s == "search") {
//!         tokio::task::yield_now().await;
//!     }
//!
//!     // the user typed another character
//!     client.cancel_scope("search", Some("new query"));
//!
//!     match pending.await? {
//!         Err(e) if client.is_cancel(&e) => println!("cancelled: {e}"),
//!         other => println!("{:?}", other.map(|r| r.status())),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod observability;
pub mod retry;
pub mod scope;
pub mod types;

pub use client::{BufferedClient, FetchClient, ScopedClient, TaskClient};
pub use error::{ErrorCategory, RequestError, Result, is_cancel};
pub use execution::http::{
    BufferedTransport, FetchTransport, LoggingInterceptor, RequestInterceptor, ResponseHooks,
    ResponseInterceptor, TaskTransport, Transport,
};
pub use scope::{CancelHandle, CancelModel, ScopeRegistry};
pub use types::{ClientConfig, HttpMethod, HttpResponse, RequestBody, RequestConfig, RequestContext};

/// Everything needed to build and use a scoped client.
pub mod prelude {
    pub use crate::client::{BufferedClient, FetchClient, ScopedClient, TaskClient};
    pub use crate::error::{RequestError, is_cancel};
    pub use crate::execution::http::{
        BufferedTransport, FetchTransport, LoggingInterceptor, RequestInterceptor, ResponseHooks,
        ResponseInterceptor, TaskTransport, Transport,
    };
    pub use crate::retry::run_with_retry;
    pub use crate::types::{
        ClientConfig, HttpMethod, HttpResponse, RequestBody, RequestConfig, RequestContext,
    };
}
