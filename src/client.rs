//! Scoped client
//!
//! [`ScopedClient`] wraps a [`Transport`] and adds named cancellation scopes,
//! named request/response interceptors and bounded retries. All state lives
//! in the client instance; two clients never share scopes or interceptors.

use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::error::{RequestError, Result};
use crate::execution::http::client::{build_http_client, validate_base_url};
use crate::execution::http::interceptor::{
    InterceptorRegistry, RequestInterceptor, ResponseInterceptor, apply_request_interceptors,
    notify_response_interceptors,
};
use crate::execution::http::transport::{
    BufferedTransport, FetchTransport, FromHttpClient, TaskTransport, Transport, TransportRequest,
};
use crate::retry::run_with_retry_unless;
use crate::scope::ScopeRegistry;
use crate::types::{ClientConfig, HttpMethod, RequestConfig, RequestContext};

/// Client over the signal-based raw-response transport.
pub type FetchClient = ScopedClient<FetchTransport>;
/// Client over the buffering, status-checking transport.
pub type BufferedClient = ScopedClient<BufferedTransport>;
/// Client over the task-per-transaction transport.
pub type TaskClient = ScopedClient<TaskTransport>;

type RequestInterceptors = InterceptorRegistry<dyn RequestInterceptor>;
type ResponseInterceptors<R> = InterceptorRegistry<dyn ResponseInterceptor<R>>;

/// Generates the plain and retrying helper for each verb.
macro_rules! verb_methods {
    ($($(#[$doc:meta])* $verb:ident, $verb_retry:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub async fn $verb(
                &self,
                scope: &str,
                url: &str,
                config: Option<RequestConfig>,
            ) -> Result<T::Response> {
                self.request($method, scope, url, config).await
            }

            $(#[$doc])*
            ///
            /// Retried up to `max_retries` times; cancellation is never retried.
            pub async fn $verb_retry(
                &self,
                scope: &str,
                max_retries: u32,
                url: &str,
                config: Option<RequestConfig>,
            ) -> Result<T::Response> {
                self.request_retry($method, scope, max_retries, url, config).await
            }
        )*
    };
}

/// Transport wrapper with scoped cancellation, interceptors and retries.
///
/// # Example
/// ```rust,no_run
/// use reqscope::prelude::*;
///
/// # async fn demo() -> reqscope::Result<()> {
/// let client = BufferedClient::from_config(
///     &ClientConfig::new().with_base_url("https://api.example.com/"),
/// )?;
/// client.add_request_interceptor("log", LoggingInterceptor);
///
/// let page = client.get("dashboard", "widgets", None).await?;
/// println!("{}", page.text());
///
/// // leaving the page
/// client.cancel_scope("dashboard", Some("navigated away"));
/// # Ok(())
/// # }
/// ```
pub struct ScopedClient<T: Transport> {
    transport: T,
    global_config: RequestConfig,
    base_url: Option<Url>,
    scopes: ScopeRegistry,
    request_interceptors: Mutex<RequestInterceptors>,
    response_interceptors: Mutex<ResponseInterceptors<T::Response>>,
}

impl<T: Transport> ScopedClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            global_config: RequestConfig::default(),
            base_url: None,
            scopes: ScopeRegistry::new(),
            request_interceptors: Mutex::new(InterceptorRegistry::new()),
            response_interceptors: Mutex::new(InterceptorRegistry::new()),
        }
    }

    /// Config used by calls that pass `None`.
    pub fn with_global_config(mut self, config: RequestConfig) -> Self {
        self.global_config = config;
        self
    }

    /// Relative request URLs are joined onto `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(validate_base_url(base_url)?);
        Ok(self)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn global_config(&self) -> &RequestConfig {
        &self.global_config
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn scope_registry(&self) -> &ScopeRegistry {
        &self.scopes
    }

    fn lock_request_interceptors(&self) -> MutexGuard<'_, RequestInterceptors> {
        self.request_interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_response_interceptors(&self) -> MutexGuard<'_, ResponseInterceptors<T::Response>> {
        self.response_interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---- interceptors ----

    /// Register `interceptor` under `name`, replacing any previous one
    /// (which keeps its position in the run order).
    pub fn add_request_interceptor<I>(&self, name: impl Into<String>, interceptor: I)
    where
        I: RequestInterceptor + 'static,
    {
        self.lock_request_interceptors()
            .insert(name, std::sync::Arc::new(interceptor));
    }

    /// Returns whether `name` was registered.
    pub fn remove_request_interceptor(&self, name: &str) -> bool {
        self.lock_request_interceptors().remove(name)
    }

    pub fn clear_request_interceptors(&self) {
        self.lock_request_interceptors().clear();
    }

    /// Registered request interceptor names, in run order.
    pub fn request_interceptors(&self) -> Vec<String> {
        self.lock_request_interceptors().names()
    }

    /// Register `interceptor` under `name`, replacing any previous one.
    pub fn add_response_interceptor<I>(&self, name: impl Into<String>, interceptor: I)
    where
        I: ResponseInterceptor<T::Response> + 'static,
    {
        self.lock_response_interceptors()
            .insert(name, std::sync::Arc::new(interceptor));
    }

    pub fn remove_response_interceptor(&self, name: &str) -> bool {
        self.lock_response_interceptors().remove(name)
    }

    pub fn clear_response_interceptors(&self) {
        self.lock_response_interceptors().clear();
    }

    /// Registered response interceptor names, in run order.
    pub fn response_interceptors(&self) -> Vec<String> {
        self.lock_response_interceptors().names()
    }

    // ---- scopes ----

    /// Scopes that currently hold cancellation state, in creation order.
    pub fn scopes(&self) -> Vec<String> {
        self.scopes.list_scopes()
    }

    /// Abort every in-flight request of `scope` and forget the scope.
    ///
    /// `reason` is carried by the resulting [`RequestError::Cancelled`].
    pub fn cancel_scope(&self, scope: &str, reason: Option<&str>) {
        self.scopes.cancel_scope(scope, reason);
    }

    /// Cancel each of `scopes` without a reason.
    pub fn cancel_scopes<I, S>(&self, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scopes.cancel_scopes(scopes);
    }

    pub fn cancel_all(&self) {
        self.scopes.cancel_all();
    }

    /// Whether `error` is this transport's cancellation error.
    pub fn is_cancel(&self, error: &RequestError) -> bool {
        self.transport.is_cancel(error)
    }

    /// Join `url` onto the base URL, or validate it as absolute.
    pub fn resolve_url(&self, url: &str) -> Result<String> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url)?,
            None => Url::parse(url)?,
        };
        Ok(resolved.into())
    }

    // ---- dispatch ----

    /// Issue one call under `scope`.
    ///
    /// `Some(config)` replaces the global config for this call; `None` uses a
    /// copy of it. Request interceptors may mutate the effective config,
    /// response interceptors observe the outcome, which is returned as-is.
    pub async fn request(
        &self,
        method: HttpMethod,
        scope: &str,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<T::Response> {
        if !self.transport.supports(method) {
            return Err(RequestError::UnsupportedMethod(method.to_string()));
        }

        let signal = self.scopes.signal(scope, self.transport.cancel_model());
        let resolved = self.resolve_url(url);
        let ctx = RequestContext::new(
            scope,
            method,
            resolved.as_deref().unwrap_or(url).to_string(),
        );

        let mut effective = config.unwrap_or_else(|| self.global_config.clone());
        let interceptors = self.lock_request_interceptors().snapshot();
        apply_request_interceptors(&interceptors, &ctx, &mut effective);

        tracing::debug!(
            target: "reqscope::http",
            request_id = %ctx.request_id,
            scope = %ctx.scope,
            method = %ctx.method,
            url = %ctx.url,
            "dispatching request"
        );

        let outcome = match resolved {
            Ok(_) => {
                let request = TransportRequest {
                    ctx: ctx.clone(),
                    config: effective,
                };
                self.transport.issue_call(request, signal).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            tracing::debug!(
                target: "reqscope::http",
                request_id = %ctx.request_id,
                scope = %ctx.scope,
                cancelled = self.transport.is_cancel(e),
                err = %e,
                "request settled with error"
            );
        }

        let observers = self.lock_response_interceptors().snapshot();
        notify_response_interceptors(&observers, &ctx, &outcome);
        outcome
    }

    /// [`request`](Self::request), retried up to `max_retries` times
    /// (`0` counts as `1`). A cancellation ends the loop immediately.
    ///
    /// Every attempt starts from the same `config`, so mutations made by
    /// request interceptors do not pile up across attempts.
    pub async fn request_retry(
        &self,
        method: HttpMethod,
        scope: &str,
        max_retries: u32,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<T::Response> {
        run_with_retry_unless(
            max_retries,
            |config: Option<RequestConfig>| self.request(method, scope, url, config),
            config,
            |e: &RequestError| self.transport.is_cancel(e),
        )
        .await
    }

    verb_methods! {
        /// GET `url` under `scope`.
        get, get_retry => HttpMethod::Get;
        /// POST `url` under `scope`.
        post, post_retry => HttpMethod::Post;
        /// PUT `url` under `scope`.
        put, put_retry => HttpMethod::Put;
        /// DELETE `url` under `scope`.
        delete, delete_retry => HttpMethod::Delete;
        /// HEAD `url` under `scope`.
        head, head_retry => HttpMethod::Head;
        /// OPTIONS `url` under `scope`.
        options, options_retry => HttpMethod::Options;
        /// PATCH `url` under `scope`.
        patch, patch_retry => HttpMethod::Patch;
        /// CONNECT `url` under `scope`, if the transport supports it.
        connect, connect_retry => HttpMethod::Connect;
        /// TRACE `url` under `scope`, if the transport supports it.
        trace, trace_retry => HttpMethod::Trace;
    }
}

impl<T: Transport + FromHttpClient> ScopedClient<T> {
    /// Build the reqwest client and transport from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        let client =
            Self::new(T::from_http_client(http)).with_global_config(config.request.clone());
        match &config.base_url {
            Some(base_url) => client.with_base_url(base_url),
            None => Ok(client),
        }
    }
}

impl<T: Transport + Default> Default for ScopedClient<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Transport> std::fmt::Debug for ScopedClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("scopes", &self.scopes())
            .field("request_interceptors", &self.request_interceptors())
            .field("response_interceptors", &self.response_interceptors())
            .finish()
    }
}
