//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use pubsub_rest::config::{ClientConfig, HostConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Response a mock host writes back.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Handle to a running mock host.
#[derive(Clone)]
pub struct MockHost {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl MockHost {
    /// Host name as configured on the client (`ip:port`).
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request lines received, e.g. `GET /time?request_id=.. HTTP/1.1`.
    pub fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().unwrap().clone()
    }
}

/// Start a programmable mock host with async support.
pub async fn start_programmable_host<F, Fut>(addr: SocketAddr, f: F) -> MockHost
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);
    let host = MockHost {
        addr,
        hits: Arc::new(AtomicUsize::new(0)),
        request_lines: Arc::new(Mutex::new(Vec::new())),
    };

    let state = host.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let state = state.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        if let Some(line) = head.lines().next() {
                            state.request_lines.lock().unwrap().push(line.to_string());
                        }
                        state.hits.fetch_add(1, Ordering::SeqCst);

                        let reply = f().await;
                        let _ = socket.write_all(&render(&reply)).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    host
}

/// Start a mock host that always returns `reply`.
pub async fn start_mock_host(addr: SocketAddr, reply: MockReply) -> MockHost {
    start_programmable_host(addr, move || {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}

/// Accept connections and never answer, forcing client timeouts.
pub async fn start_blackhole(addr: SocketAddr) -> MockHost {
    let listener = TcpListener::bind(addr).await.unwrap();
    let host = MockHost {
        addr,
        hits: Arc::new(AtomicUsize::new(0)),
        request_lines: Arc::new(Mutex::new(Vec::new())),
    };

    let state = host.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            state.hits.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    host
}

/// Plaintext client configuration over `ip:port` hosts.
pub fn client_config(primary: &str, fallbacks: &[String]) -> ClientConfig {
    let mut config = ClientConfig {
        hosts: HostConfig {
            primary_host: Some(primary.to_string()),
            fallback_hosts: Some(fallbacks.to_vec()),
            tls: false,
            ..Default::default()
        },
        ..Default::default()
    };
    config.timeouts.request_ms = 2_000;
    config.timeouts.connect_ms = 1_000;
    config
}

fn render(reply: &MockReply) -> Vec<u8> {
    let reason = StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");

    let mut head = format!("HTTP/1.1 {} {}\r\n", reply.status, reason);
    if let Some(content_type) = reply.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        reply.body.len()
    ));

    let mut out = head.into_bytes();
    out.extend_from_slice(&reply.body);
    out
}
