//! Reachability check for http and sse servers.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

use mcpreg_core::TransportKind;

/// What a single GET against a remote server produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointCheck {
    /// A response arrived with an acceptable status.
    Reachable { status: u16, latency_ms: u64 },
    /// A response arrived, but its status means the server is not usable.
    Rejected { status: u16 },
    /// Nothing arrived before the timeout.
    TimedOut,
    /// The request could not be made (DNS, refused, TLS, bad header).
    Failed(String),
}

/// A response counts as reachable unless the server errored or the path
/// does not exist. Auth failures and method errors still prove a server
/// is listening.
pub const fn is_reachable_status(status: u16) -> bool {
    status != 404 && !matches!(status, 500..=599)
}

fn accept_header(transport: TransportKind) -> &'static str {
    match transport {
        TransportKind::Sse => "text/event-stream",
        TransportKind::Http | TransportKind::Stdio => "application/json, text/event-stream",
    }
}

fn build_headers(
    transport: TransportKind,
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::new();
    map.insert(ACCEPT, HeaderValue::from_static(accept_header(transport)));
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| format!("Invalid header name '{key}': {e}"))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| format!("Invalid value for header '{key}': {e}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn is_loopback(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|u| {
        matches!(u.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
    })
}

/// Issue one GET to `url` bounded by `timeout`.
pub async fn check_endpoint(
    transport: TransportKind,
    url: &str,
    headers: &BTreeMap<String, String>,
    timeout: Duration,
) -> EndpointCheck {
    let headers = match build_headers(transport, headers) {
        Ok(headers) => headers,
        Err(message) => return EndpointCheck::Failed(message),
    };

    let mut builder = Client::builder().timeout(timeout);
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    let client = match builder.build() {
        Ok(client) => client,
        Err(e) => return EndpointCheck::Failed(format!("Failed to build HTTP client: {e}")),
    };

    let started = Instant::now();
    match client.get(url).headers(headers).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(url, status, latency_ms, "Endpoint answered");
            if is_reachable_status(status) {
                EndpointCheck::Reachable { status, latency_ms }
            } else {
                EndpointCheck::Rejected { status }
            }
        }
        Err(e) if e.is_timeout() => EndpointCheck::TimedOut,
        Err(e) => {
            tracing::debug!(url, error = %e, "Endpoint request failed");
            EndpointCheck::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on an ephemeral port.
    async fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response =
                format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/mcp")
    }

    #[test]
    fn test_status_rule() {
        assert!(is_reachable_status(200));
        assert!(is_reachable_status(401));
        assert!(is_reachable_status(405));
        assert!(!is_reachable_status(404));
        assert!(!is_reachable_status(500));
        assert!(!is_reachable_status(503));
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback("http://127.0.0.1:8080/mcp"));
        assert!(is_loopback("http://localhost/sse"));
        assert!(!is_loopback("https://mcp.example.com/sse"));
        assert!(!is_loopback("not a url"));
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(build_headers(TransportKind::Http, &headers).is_err());
    }

    #[tokio::test]
    async fn test_ok_response_is_reachable() {
        let url = serve_once("200 OK").await;
        let check = check_endpoint(
            TransportKind::Http,
            &url,
            &BTreeMap::new(),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(check, EndpointCheck::Reachable { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_rejected() {
        let url = serve_once("404 Not Found").await;
        let check = check_endpoint(
            TransportKind::Sse,
            &url,
            &BTreeMap::new(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(check, EndpointCheck::Rejected { status: 404 });
    }

    #[tokio::test]
    async fn test_refused_connection_fails() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check = check_endpoint(
            TransportKind::Http,
            &format!("http://{addr}/"),
            &BTreeMap::new(),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(check, EndpointCheck::Failed(_)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let check = check_endpoint(
            TransportKind::Http,
            &format!("http://{addr}/"),
            &BTreeMap::new(),
            Duration::from_millis(200),
        )
        .await;
        assert_eq!(check, EndpointCheck::TimedOut);
    }
}
