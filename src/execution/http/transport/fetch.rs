//! Signal-based transport returning raw responses.

use async_trait::async_trait;

use super::{FromHttpClient, Transport, TransportRequest, bind_signal, build_request};
use crate::error::{RequestError, Result};
use crate::scope::{CancelModel, CancelSignal};

/// Issues calls through `reqwest` and hands back the unread
/// `reqwest::Response`. Non-2xx statuses resolve normally.
///
/// All requests of a scope share one cancellation handle. The handle covers
/// the call until the response headers arrive; reading the body of the
/// returned response is not bound to it. To make body reads cancellable too,
/// race them against the scope's handle:
///
/// ```rust,ignore
/// let handle = client.scope_registry().get_or_create_handle("page");
/// let response = client.get("page", url, None).await?;
/// let body = handle
///     .run_until_cancelled(async move { response.bytes().await.map_err(RequestError::from) })
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl FromHttpClient for FetchTransport {
    fn from_http_client(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for FetchTransport {
    type Response = reqwest::Response;

    fn cancel_model(&self) -> CancelModel {
        CancelModel::SharedSignal
    }

    async fn issue_call(
        &self,
        request: TransportRequest,
        signal: CancelSignal,
    ) -> Result<reqwest::Response> {
        let builder = build_request(&self.client, &request)?;
        let (handle, _registration) = bind_signal(signal);
        handle
            .run_until_cancelled(async move { builder.send().await.map_err(RequestError::from) })
            .await
    }
}
