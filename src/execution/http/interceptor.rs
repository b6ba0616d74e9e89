//! HTTP Interceptor interfaces
//!
//! Request interceptors run, in registration order, against the effective
//! request config right before the transport call and may mutate it in place.
//! Response interceptors run, in registration order, once the call settles;
//! exactly one of `on_fulfilled` / `on_rejected` is invoked per request and
//! they cannot change the outcome the caller sees.

use std::sync::Arc;

use crate::error::RequestError;
use crate::types::{RequestConfig, RequestContext, ResponseMeta};

/// Hook invoked before every request.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, ctx: &RequestContext, config: &mut RequestConfig);
}

impl<F> RequestInterceptor for F
where
    F: Fn(&RequestContext, &mut RequestConfig) + Send + Sync,
{
    fn on_request(&self, ctx: &RequestContext, config: &mut RequestConfig) {
        self(ctx, config)
    }
}

/// Hook invoked after every request settles.
pub trait ResponseInterceptor<R>: Send + Sync {
    /// Called when the transport call resolved.
    fn on_fulfilled(&self, _ctx: &RequestContext, _response: &R) {}

    /// Called when the transport call failed, cancellation included.
    fn on_rejected(&self, _ctx: &RequestContext, _error: &RequestError) {}
}

/// Response interceptor built from a fulfil closure and a reject closure.
pub struct ResponseHooks<F, G> {
    fulfill: F,
    reject: G,
}

impl<F, G> ResponseHooks<F, G> {
    pub const fn new(fulfill: F, reject: G) -> Self {
        Self { fulfill, reject }
    }
}

impl<R, F, G> ResponseInterceptor<R> for ResponseHooks<F, G>
where
    F: Fn(&RequestContext, &R) + Send + Sync,
    G: Fn(&RequestContext, &RequestError) + Send + Sync,
{
    fn on_fulfilled(&self, ctx: &RequestContext, response: &R) {
        (self.fulfill)(ctx, response)
    }

    fn on_rejected(&self, ctx: &RequestContext, error: &RequestError) {
        (self.reject)(ctx, error)
    }
}

/// A simple logging interceptor backed by `tracing` (no bodies, no header values).
#[derive(Clone, Debug, Default)]
pub struct LoggingInterceptor;

impl RequestInterceptor for LoggingInterceptor {
    fn on_request(&self, ctx: &RequestContext, config: &mut RequestConfig) {
        tracing::debug!(
            target: "reqscope::http",
            request_id = %ctx.request_id,
            scope = %ctx.scope,
            method = %ctx.method,
            url = %ctx.url,
            headers = config.headers.len(),
            has_body = config.body.is_some(),
            "sending request"
        );
    }
}

impl<R: ResponseMeta> ResponseInterceptor<R> for LoggingInterceptor {
    fn on_fulfilled(&self, ctx: &RequestContext, response: &R) {
        tracing::debug!(
            target: "reqscope::http",
            request_id = %ctx.request_id,
            scope = %ctx.scope,
            url = %response.final_url(),
            status = response.status_code(),
            "response received"
        );
    }

    fn on_rejected(&self, ctx: &RequestContext, error: &RequestError) {
        tracing::debug!(
            target: "reqscope::http",
            request_id = %ctx.request_id,
            scope = %ctx.scope,
            url = %ctx.url,
            cancelled = error.is_cancel(),
            err = %error,
            "request error"
        );
    }
}

/// Name → interceptor map that iterates in insertion order.
///
/// Re-inserting an existing name replaces the interceptor but keeps its
/// position.
pub struct InterceptorRegistry<I: ?Sized> {
    entries: Vec<(String, Arc<I>)>,
}

impl<I: ?Sized> Default for InterceptorRegistry<I> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<I: ?Sized> InterceptorRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, interceptor: Arc<I>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = interceptor,
            None => self.entries.push((name, interceptor)),
        }
    }

    /// Returns whether an interceptor was registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<Arc<I>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, i)| i.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Interceptors in invocation order.
    pub fn snapshot(&self) -> Vec<Arc<I>> {
        self.entries.iter().map(|(_, i)| i.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: ?Sized> std::fmt::Debug for InterceptorRegistry<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Run request interceptors in order against `config`.
pub fn apply_request_interceptors(
    interceptors: &[Arc<dyn RequestInterceptor>],
    ctx: &RequestContext,
    config: &mut RequestConfig,
) {
    for interceptor in interceptors {
        interceptor.on_request(ctx, config);
    }
}

/// Notify response interceptors of a settled outcome.
pub fn notify_response_interceptors<R>(
    interceptors: &[Arc<dyn ResponseInterceptor<R>>],
    ctx: &RequestContext,
    outcome: &Result<R, RequestError>,
) {
    for interceptor in interceptors {
        match outcome {
            Ok(response) => interceptor.on_fulfilled(ctx, response),
            Err(error) => interceptor.on_rejected(ctx, error),
        }
    }
}
