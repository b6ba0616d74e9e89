//! Cancellation handles
//!
//! A [`CancelHandle`] is shared by every request issued under one scope.
//! Clones observe the same cancellation, so a request that captured the
//! handle still sees the cancel after the registry has forgotten it.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::{RequestError, Result};

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<Option<String>>>,
}

impl CancelHandle {
    /// Create a new, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The first reason given wins.
    pub fn cancel(&self, reason: Option<&str>) {
        let _ = self.reason.set(reason.map(str::to_string));
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Reason passed to [`cancel`](Self::cancel), if any.
    pub fn reason(&self) -> Option<String> {
        self.reason.get().cloned().flatten()
    }

    /// The error requests bound to this handle fail with once cancelled.
    pub fn cancellation_error(&self) -> RequestError {
        RequestError::Cancelled {
            reason: self.reason(),
        }
    }

    /// Whether `other` is a clone of this handle.
    pub fn same_as(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.reason, &other.reason)
    }

    /// Drive `future` unless this handle is cancelled first, in which case
    /// the future is dropped and the cancellation error returned.
    pub async fn run_until_cancelled<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(self.cancellation_error());
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(self.cancellation_error()),
            res = future => res,
        }
    }
}

/// Callback aborting one in-flight transaction. Receives the cancel reason.
pub type AbortCallback = Box<dyn FnOnce(Option<&str>) + Send + 'static>;

/// The per-transaction abort callbacks registered under one scope.
#[derive(Default)]
pub struct AbortSet {
    callbacks: Vec<(u64, AbortCallback)>,
}

impl AbortSet {
    pub fn insert(&mut self, id: u64, callback: AbortCallback) {
        self.callbacks.push((id, callback));
    }

    /// Drop the callback registered under `id`. Returns whether it was present.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        before != self.callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invoke every callback once and leave the set empty.
    pub fn abort_all(&mut self, reason: Option<&str>) {
        for (_, abort) in self.callbacks.drain(..) {
            abort(reason);
        }
    }
}

impl std::fmt::Debug for AbortSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSet")
            .field("len", &self.callbacks.len())
            .finish()
    }
}
