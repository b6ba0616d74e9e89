//! Error Handling Module
//!
//! This module provides the error type shared by every transport binding:
//! - Core error types (`RequestError`, `ErrorCategory`)
//! - Cancellation detection (`is_cancel`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use reqscope::error::{ErrorCategory, RequestError};
//!
//! let error = RequestError::status(404, "Not Found", "");
//! assert_eq!(error.category(), ErrorCategory::Client);
//! assert!(!error.is_cancel());
//! ```

mod conversions;
pub mod types;

pub use types::*;

/// Whether `error` was produced by an explicit cancel rather than by the
/// network or the server.
pub fn is_cancel(error: &RequestError) -> bool {
    error.is_cancel()
}
