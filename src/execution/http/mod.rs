//! HTTP execution helpers

pub mod client;
pub mod interceptor;
pub mod transport;

pub use client::build_http_client;
pub use interceptor::{
    InterceptorRegistry, LoggingInterceptor, RequestInterceptor, ResponseHooks,
    ResponseInterceptor,
};
pub use transport::{
    BufferedTransport, FetchTransport, FromHttpClient, TaskTransport, Transport, TransportRequest,
};
