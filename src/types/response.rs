//! Buffered response snapshot.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{RequestError, Result};

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Final URL after redirects
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Read `response` to the end.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            url,
            headers,
            body,
        })
    }

    /// 2xx
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(RequestError::from)
    }

    /// Turn a non-2xx snapshot into a [`RequestError::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RequestError::status(
                self.status,
                self.status_text.clone(),
                self.text(),
            ))
        }
    }
}

/// Minimal view of a settled response, shared by raw and buffered responses.
pub trait ResponseMeta {
    fn status_code(&self) -> u16;
    fn final_url(&self) -> &str;
}

impl ResponseMeta for HttpResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn final_url(&self) -> &str {
        &self.url
    }
}

impl ResponseMeta for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn final_url(&self) -> &str {
        self.url().as_str()
    }
}
