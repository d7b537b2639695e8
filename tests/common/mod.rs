//! Minimal HTTP/1.1 backend for integration tests
//!
//! Serves canned JSON responses in order (the last one repeats) and records
//! every request it receives.

#![allow(dead_code)]

use rust_manga_reader::gateway::{GatewayConfig, HttpGateway, RecordingNavigator};
use rust_manga_reader::models::{Role, Session, StoredUser};
use rust_manga_reader::session::SessionStore;
use rust_manga_reader::storage::MemoryStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

pub fn json(status: u16, body: serde_json::Value) -> CannedResponse {
    CannedResponse {
        status,
        body: body.to_string(),
    }
}

pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    pub async fn start(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let response = responses
                    .get(served)
                    .or_else(|| responses.last())
                    .cloned()
                    .unwrap_or(CannedResponse {
                        status: 404,
                        body: String::new(),
                    });
                served += 1;
                handle(socket, response, &captured).await;
            }
        });

        Self {
            base_url: format!("http://{}/api", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn handle(
    mut socket: TcpStream,
    response: CannedResponse,
    captured: &Arc<Mutex<Vec<CapturedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    captured.lock().unwrap().push(CapturedRequest {
        method,
        path,
        headers,
        body,
    });

    let reply = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    let _ = socket.write_all(reply.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Address that refuses connections
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

/// Address that accepts connections and never answers
pub async fn silent_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}/api", addr)
}

pub struct Harness {
    pub durable: Arc<MemoryStore>,
    pub tab: Arc<MemoryStore>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub gateway: Arc<HttpGateway>,
}

pub fn harness(base_url: &str) -> Harness {
    harness_with_timeout(base_url, Duration::from_secs(5))
}

pub fn harness_with_timeout(base_url: &str, timeout: Duration) -> Harness {
    let durable = Arc::new(MemoryStore::new());
    let tab = Arc::new(MemoryStore::new());
    let session = Arc::new(SessionStore::new(durable.clone(), tab.clone()));
    let navigator = Arc::new(RecordingNavigator::new());
    let config = GatewayConfig {
        base_url: base_url.to_string(),
        timeout,
        login_path: "/login".to_string(),
    };
    let gateway =
        Arc::new(HttpGateway::new(config, session.clone(), navigator.clone()).unwrap());

    Harness {
        durable,
        tab,
        session,
        navigator,
        gateway,
    }
}

pub fn user(role: Role) -> StoredUser {
    StoredUser {
        id: "u-1".to_string(),
        username: "akane".to_string(),
        email: Some("akane@example.com".to_string()),
        avatar_url: None,
        role,
    }
}

pub fn session(role: Role) -> Session {
    Session {
        access_token: "secret-token".to_string(),
        user: user(role),
    }
}
