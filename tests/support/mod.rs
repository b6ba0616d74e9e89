//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// How long a "slow" endpoint holds the response.
pub const SLOW: Duration = Duration::from_secs(5);

/// Mock server with `/slow` (held for [`SLOW`]) and `/fast` endpoints.
pub async fn start_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"slow": true}))
                .set_delay(SLOW),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fast": true})))
        .mount(&server)
        .await;
    server
}

/// Poll `condition` until it holds; panics after about a second.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// A URL nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:1/";

/// Accepts one connection and never answers it.
///
/// Returns the server URL and a receiver that fires once the client side of
/// the connection is closed.
pub async fn silent_server() -> (String, tokio::sync::oneshot::Receiver<()>) {
    use tokio::io::AsyncReadExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent server");
    let addr = listener.local_addr().expect("silent server address");
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 1024];
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
        let _ = closed_tx.send(());
    });

    (format!("http://{addr}/"), closed_rx)
}

/// Sends response headers plus part of the body, then stalls forever.
pub async fn stalled_body_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stalled server");
    let addr = listener.local_addr().expect("stalled server address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\npartial")
            .await;
        // hold the connection open without finishing the body
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(SLOW).await;
    });

    format!("http://{addr}/")
}
