//! HTTP client builder utilities
//!
//! Every reqwest-backed transport is built from the same [`ClientConfig`], so
//! timeouts, proxy and default headers behave identically across them.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{RequestError, Result};
use crate::types::ClientConfig;

/// Build a `reqwest::Client` from a [`ClientConfig`].
///
/// The base URL is checked here too, so a bad config fails at construction
/// rather than on the first request.
///
/// # Example
/// ```rust,no_run
/// use reqscope::types::ClientConfig;
/// use reqscope::execution::http::client::build_http_client;
///
/// let config = ClientConfig::default();
/// let client = build_http_client(&config)?;
/// # Ok::<(), reqscope::RequestError>(())
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    if let Some(base_url) = &config.base_url {
        validate_base_url(base_url)?;
    }

    let mut builder = reqwest::Client::builder().default_headers(default_headers(config)?);

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| RequestError::Configuration(format!("Invalid proxy URL '{proxy_url}': {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RequestError::Configuration(format!("Failed to create HTTP client: {e}")))
}

/// A base URL must be absolute http(s) and able to have paths joined onto it.
pub(crate) fn validate_base_url(base_url: &str) -> Result<url::Url> {
    let url = url::Url::parse(base_url)?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(RequestError::InvalidUrl(format!(
            "Base URL must be an absolute http(s) URL: {base_url}"
        )));
    }
    Ok(url)
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());
    for (k, v) in &config.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|e| RequestError::InvalidHeader(format!("Invalid header name '{k}': {e}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|e| RequestError::InvalidHeader(format!("Invalid header value for '{k}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
