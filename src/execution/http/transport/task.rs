//! Transaction-per-task transport with per-call abort callbacks.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio_util::task::AbortOnDropHandle;

use super::{FromHttpClient, Transport, TransportRequest, build_request};
use crate::error::{RequestError, Result};
use crate::scope::{CancelModel, CancelSignal};
use crate::types::HttpResponse;

/// Runs each call as its own tokio task. The task's abort handle is
/// registered under the request's scope, so cancelling the scope aborts
/// every transaction still in flight there. Dropping the request future
/// aborts the transaction too.
///
/// Non-2xx statuses resolve normally.
#[derive(Debug, Clone, Default)]
pub struct TaskTransport {
    client: reqwest::Client,
}

impl TaskTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl FromHttpClient for TaskTransport {
    fn from_http_client(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for TaskTransport {
    type Response = HttpResponse;

    fn cancel_model(&self) -> CancelModel {
        CancelModel::AbortCallbacks
    }

    async fn issue_call(
        &self,
        request: TransportRequest,
        signal: CancelSignal,
    ) -> Result<HttpResponse> {
        let builder = build_request(&self.client, &request)?;
        let mut transaction = AbortOnDropHandle::new(tokio::spawn(async move {
            let response = builder.send().await?;
            HttpResponse::from_reqwest(response).await
        }));

        let reason: Arc<OnceLock<Option<String>>> = Arc::default();

        let joined = match signal {
            CancelSignal::Callbacks(registrar) => {
                let abort = transaction.abort_handle();
                let slot = reason.clone();
                // removed from the scope when dropped, i.e. once the call settles
                let _registration = registrar.register(move |why| {
                    let _ = slot.set(why.map(str::to_string));
                    abort.abort();
                });
                transaction.await
            }
            CancelSignal::Shared(handle) => {
                tokio::select! {
                    biased;
                    // dropping `transaction` aborts it
                    _ = handle.cancelled() => return Err(handle.cancellation_error()),
                    joined = &mut transaction => joined,
                }
            }
        };

        match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(RequestError::Cancelled {
                reason: reason.get().cloned().flatten(),
            }),
            Err(e) => Err(RequestError::Http(format!("transaction task failed: {e}"))),
        }
    }
}
