//! Client and per-request configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Request body passed through to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
    /// Serialized as JSON with `content-type: application/json`.
    Json(serde_json::Value),
    /// Sent as-is.
    Text(String),
    /// Sent as-is.
    Bytes(Vec<u8>),
    /// `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// Per-call option bag.
///
/// Carries no cancellation field; the scoped client owns the signal of every
/// request it issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Query string pairs, appended in order
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Optional request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    /// Per-request timeout (milliseconds on the wire)
    #[serde(default, with = "duration_option_millis")]
    pub timeout: Option<Duration>,
    /// Sent as `Authorization: Bearer <token>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query pair.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(text.into()));
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(RequestBody::Bytes(bytes.into()));
        self
    }

    pub fn with_form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Instance-wide configuration used to build a reqwest-backed client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL relative request URLs are joined onto
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout
    #[serde(default, with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(default, with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Default headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Proxy settings
    #[serde(default)]
    pub proxy: Option<String>,
    /// User agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Global request config, used when a call passes no config of its own
    #[serde(default)]
    pub request: RequestConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let user_agent = std::env::var(crate::defaults::http::USER_AGENT_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| crate::defaults::http::USER_AGENT.to_string());
        Self {
            base_url: None,
            timeout: Some(crate::defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(crate::defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(user_agent),
            request: RequestConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }
}

// Durations as whole seconds
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// Durations as milliseconds
mod duration_option_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => (d.as_millis() as u64).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_config_builders() {
        let config = RequestConfig::new()
            .with_header("x-trace", "abc")
            .with_query("page", "2")
            .with_query("page", "3")
            .with_json(json!({"k": "v"}))
            .with_timeout(Duration::from_millis(1500));

        assert_eq!(config.headers.get("x-trace").map(String::as_str), Some("abc"));
        assert_eq!(config.query.len(), 2);
        assert_eq!(config.body, Some(RequestBody::Json(json!({"k": "v"}))));
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn request_config_deserializes_with_defaults() {
        let config: RequestConfig =
            serde_json::from_value(json!({"timeout": 250, "body": {"type": "text", "value": "hi"}}))
                .unwrap();
        assert!(config.headers.is_empty());
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.body, Some(RequestBody::Text("hi".into())));
    }

    #[test]
    fn client_config_round_trips_seconds() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:8080/api/")
            .with_timeout(Duration::from_secs(5));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout"], json!(5));
        let back: ClientConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn client_config_default_has_user_agent() {
        let config = ClientConfig::default();
        assert!(config.user_agent.is_some());
        assert_eq!(config.timeout, Some(crate::defaults::http::REQUEST_TIMEOUT));
    }
}
