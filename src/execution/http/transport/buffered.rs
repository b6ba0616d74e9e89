//! Signal-based transport with buffered bodies and status checking.

use async_trait::async_trait;

use super::{FromHttpClient, Transport, TransportRequest, bind_signal, build_request};
use crate::error::Result;
use crate::scope::{CancelModel, CancelSignal};
use crate::types::{HttpMethod, HttpResponse};

/// Reads every body into an [`HttpResponse`] and rejects non-2xx statuses
/// with [`RequestError::Status`](crate::error::RequestError::Status).
///
/// Only the seven common verbs are available; CONNECT and TRACE fail with
/// `UnsupportedMethod`.
#[derive(Debug, Clone, Default)]
pub struct BufferedTransport {
    client: reqwest::Client,
}

impl BufferedTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl FromHttpClient for BufferedTransport {
    fn from_http_client(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for BufferedTransport {
    type Response = HttpResponse;

    fn cancel_model(&self) -> CancelModel {
        CancelModel::SharedSignal
    }

    fn supports(&self, method: HttpMethod) -> bool {
        !method.is_extension()
    }

    async fn issue_call(
        &self,
        request: TransportRequest,
        signal: CancelSignal,
    ) -> Result<HttpResponse> {
        let builder = build_request(&self.client, &request)?;
        let (handle, _registration) = bind_signal(signal);
        let response = handle
            .run_until_cancelled(async move {
                let response = builder.send().await?;
                HttpResponse::from_reqwest(response).await
            })
            .await?;
        response.error_for_status()
    }
}
