//! Retry Mechanism Module
//!
//! Bounded, sequential re-invocation of an async task. There is no delay
//! between attempts and no backoff; a caller-supplied predicate can mark a
//! failure as terminal (the scoped clients use this so cancelled requests are
//! never retried).

pub mod driver;

pub use driver::{RetryBudget, run_with_retry, run_with_retry_unless};
