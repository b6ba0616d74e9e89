//! Retry driver.
//!
//! The bound counts *retries*, not attempts: with a bound of `n` the task is
//! invoked at most `n + 1` times. A bound of 0 is raised to 1, so every
//! driven task gets at least one retry.

use std::future::Future;

use crate::defaults::retry::MIN_RETRIES;

/// Remaining retry allowance for one driven task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    /// Budget for `max_retries`, clamped to at least one retry.
    pub fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries.max(MIN_RETRIES),
        }
    }

    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Take one retry from the budget. Returns false when none are left.
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Run `task(args)` and re-run it with the same arguments on failure, up to
/// `max_retries` retries.
pub async fn run_with_retry<A, T, E, F, Fut>(max_retries: u32, task: F, args: A) -> Result<T, E>
where
    A: Clone,
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run_with_retry_unless(max_retries, task, args, |_: &E| false).await
}

/// Like [`run_with_retry`], but a failure for which `should_abort_immediately`
/// returns true is returned at once regardless of the remaining budget.
pub async fn run_with_retry_unless<A, T, E, F, Fut, P>(
    max_retries: u32,
    mut task: F,
    args: A,
    should_abort_immediately: P,
) -> Result<T, E>
where
    A: Clone,
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut budget = RetryBudget::new(max_retries);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match task(args.clone()).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if budget.is_exhausted() {
                    tracing::debug!(target: "reqscope::retry", attempt, "retry budget exhausted");
                    return Err(error);
                }
                if should_abort_immediately(&error) {
                    tracing::debug!(target: "reqscope::retry", attempt, "terminal failure, not retrying");
                    return Err(error);
                }
                budget.try_consume();
                tracing::debug!(
                    target: "reqscope::retry",
                    attempt,
                    remaining = budget.remaining(),
                    "attempt failed, retrying"
                );
            }
        }
    }
}
