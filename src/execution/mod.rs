//! Execution layer
//!
//! HTTP client construction, interceptors and the transports that actually
//! put requests on the wire.

pub mod http;
