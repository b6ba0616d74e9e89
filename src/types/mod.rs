//! Shared request/response types.

pub mod config;
pub mod method;
pub mod response;

pub use config::{ClientConfig, RequestBody, RequestConfig};
pub use method::HttpMethod;
pub use response::{HttpResponse, ResponseMeta};

/// Metadata describing one dispatched request, handed to interceptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub scope: String,
    pub method: HttpMethod,
    pub url: String,
}

impl RequestContext {
    pub fn new(scope: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            request_id: generate_request_id(),
            scope: scope.into(),
            method,
            url: url.into(),
        }
    }
}

/// Generate a unique request id.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
