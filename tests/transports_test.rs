//! Behaviour specific to each transport and to client construction.

use std::time::Duration;

use reqscope::prelude::*;
use serde_json::json;
use tokio_test::assert_err;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn buffered_status_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("locked"))
        .mount(&server)
        .await;

    let client = BufferedClient::default();
    let err = client
        .delete("s", &format!("{}/items/1", server.uri()), None)
        .await
        .unwrap_err();
    match err {
        RequestError::Status { status, body, .. } => {
            assert_eq!(status, 409);
            assert_eq!(body, "locked");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn buffered_client_has_no_connect_or_trace() {
    let client = BufferedClient::default();
    let err = client
        .connect("s", "http://127.0.0.1:1/", None)
        .await
        .unwrap_err();
    assert_eq!(err, RequestError::UnsupportedMethod("CONNECT".into()));
    assert_err!(client.trace_retry("s", 3, "http://127.0.0.1:1/", None).await);
    assert!(client.scopes().is_empty());
}

#[tokio::test]
async fn every_verb_is_dispatched_with_its_method() {
    let server = MockServer::start().await;
    for verb in ["GET", "POST", "PUT", "DELETE", "OPTIONS", "PATCH", "HEAD"] {
        Mock::given(method(verb))
            .and(path("/verbs"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = TaskClient::default();
    let url = format!("{}/verbs", server.uri());
    assert_eq!(client.get("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.post("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.put("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.delete("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.options("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.patch("v", &url, None).await.unwrap().status, 204);
    assert_eq!(client.head("v", &url, None).await.unwrap().status, 204);
    server.verify().await;
}

#[tokio::test]
async fn from_config_applies_base_url_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("x-client", "reqscope-tests"))
        .and(header("user-agent", "orders-ui/1.0"))
        .and(body_json(json!({"sku": "A-1", "qty": 2})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(format!("{}/api/", server.uri()))
        .with_header("x-client", "reqscope-tests")
        .with_user_agent("orders-ui/1.0")
        .with_timeout(Duration::from_secs(5));
    let client = BufferedClient::from_config(&config).unwrap();

    let res = client
        .post(
            "checkout",
            "orders",
            Some(RequestConfig::new().with_json(json!({"sku": "A-1", "qty": 2}))),
        )
        .await
        .unwrap();
    assert_eq!(res.status, 201);
    let body: serde_json::Value = res.json().unwrap();
    assert_eq!(body["id"], 42);
    server.verify().await;
}

#[tokio::test]
async fn per_call_config_replaces_global_config() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/form"))
        .and(body_string_contains("name=ada"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = FetchClient::default()
        .with_global_config(RequestConfig::new().with_header("x-global", "1"));
    let url = format!("{}/form", server.uri());

    let res = client
        .put(
            "s",
            &url,
            Some(RequestConfig::new().with_form([("name", "ada")])),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-global").is_none());
}

#[tokio::test]
async fn global_config_is_used_when_call_passes_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g"))
        .and(header("x-global", "1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = TaskClient::default()
        .with_global_config(RequestConfig::new().with_header("x-global", "1"));
    client
        .get("s", &format!("{}/g", server.uri()), None)
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn request_timeout_is_not_a_cancellation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = FetchClient::default();
    let err = client
        .get(
            "s",
            &format!("{}/hang", server.uri()),
            Some(RequestConfig::new().with_timeout(Duration::from_millis(50))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Timeout(_)));
    assert!(!client.is_cancel(&err));
}

#[tokio::test]
async fn relative_url_without_base_is_invalid() {
    let client = TaskClient::default();
    let err = client.get("s", "/relative", None).await.unwrap_err();
    assert!(matches!(err, RequestError::InvalidUrl(_)));
    assert!(!is_cancel(&err));
}
