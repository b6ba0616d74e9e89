//! Default Configuration Values
//!
//! This module centralizes the default values used by scoped clients.

use std::time::Duration;

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default request timeout for HTTP requests
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("reqscope/", env!("CARGO_PKG_VERSION"));

    /// Environment variable overriding the default User-Agent
    pub const USER_AGENT_ENV: &str = "REQSCOPE_USER_AGENT";
}

/// Retry defaults
pub mod retry {
    /// Smallest retry bound the driver accepts; lower values are raised to it.
    pub const MIN_RETRIES: u32 = 1;
}

/// Tracing defaults
pub mod tracing {
    /// Filter directive used when `RUST_LOG` is unset.
    pub const DEFAULT_DIRECTIVE: &str = "info";
}
