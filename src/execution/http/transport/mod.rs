//! HTTP transport abstraction
//!
//! A [`Transport`] issues one call bound to a cancellation signal. The scoped
//! client does everything else (scopes, interceptors, retries), so a
//! transport only decides how it talks to the network, what it returns, and
//! which [`CancelModel`] it wants.

mod buffered;
mod fetch;
mod task;

pub use buffered::BufferedTransport;
pub use fetch::FetchTransport;
pub use task::TaskTransport;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

use crate::error::{RequestError, Result};
use crate::scope::{AbortRegistration, CancelHandle, CancelModel, CancelSignal};
use crate::types::{HttpMethod, RequestBody, RequestConfig, RequestContext};

/// One call as seen by a transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub ctx: RequestContext,
    /// Effective config, after request interceptors ran.
    pub config: RequestConfig,
}

impl TransportRequest {
    pub const fn method(&self) -> HttpMethod {
        self.ctx.method
    }

    pub fn url(&self) -> &str {
        &self.ctx.url
    }
}

/// Adapter between a scoped client and an underlying HTTP mechanism.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Response: Send + 'static;

    /// How cancellation reaches this transport's calls.
    fn cancel_model(&self) -> CancelModel;

    /// Whether this transport can issue `method`.
    fn supports(&self, _method: HttpMethod) -> bool {
        true
    }

    /// Issue the call, aborting it when `signal` fires.
    async fn issue_call(
        &self,
        request: TransportRequest,
        signal: CancelSignal,
    ) -> Result<Self::Response>;

    /// Did `error` come from an explicit cancel rather than the network?
    fn is_cancel(&self, error: &RequestError) -> bool {
        error.is_cancel()
    }
}

/// Transports that wrap a `reqwest::Client`.
pub trait FromHttpClient {
    fn from_http_client(client: reqwest::Client) -> Self;
}

/// Translate a [`TransportRequest`] into a reqwest builder.
pub fn build_request(
    client: &reqwest::Client,
    request: &TransportRequest,
) -> Result<reqwest::RequestBuilder> {
    let url = reqwest::Url::parse(request.url())?;
    let config = &request.config;
    let mut builder = client.request(request.method().into(), url);

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        builder = builder.header(name, value);
    }

    if !config.query.is_empty() {
        builder = builder.query(&config.query);
    }

    if let Some(body) = &config.body {
        builder = match body {
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Form(pairs) => builder.form(pairs),
        };
    }

    if let Some(token) = &config.bearer_token {
        builder = builder.bearer_auth(token);
    }

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder)
}

/// Turn any signal into a handle the caller can race against.
///
/// For the callback model a fresh handle is created and its `cancel` is
/// registered under the scope; keep the returned registration alive until
/// the call settles.
pub fn bind_signal(signal: CancelSignal) -> (CancelHandle, Option<AbortRegistration>) {
    match signal {
        CancelSignal::Shared(handle) => (handle, None),
        CancelSignal::Callbacks(registrar) => {
            let handle = CancelHandle::new();
            let bound = handle.clone();
            let registration = registrar.register(move |reason| bound.cancel(reason));
            (handle, Some(registration))
        }
    }
}
