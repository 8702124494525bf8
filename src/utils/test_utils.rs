//! In-process HTTP mock for exercising the API client.
//!
//! Routes are keyed by `"METHOD /path"` relative to [`MockServer::base_url`].
//! A route given several responses replays them in order and then keeps
//! repeating the last one. Unknown routes answer 404.

use crate::api::{ApiClient, ApiSettings, SessionCredentials};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const BASE_PATH: &str = "/api";

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Overrides the advertised `content-length`; a value larger than the
    /// body makes the connection close mid-body.
    pub declared_length: Option<usize>,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            declared_length: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            declared_length: None,
        }
    }

    /// Response whose body ends before the advertised length.
    pub fn truncated(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            declared_length: Some(body.len() + 64),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            declared_length: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

type Routes = Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>;

pub struct MockServer {
    base_url: String,
    routes: Routes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        clear_proxy_env();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let task = tokio::spawn({
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            async move {
                loop {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        break;
                    };
                    let Ok(request) = read_http_request(&mut stream).await else {
                        continue;
                    };
                    let response = next_response(&routes, &request.route());
                    requests.lock().expect("requests lock").push(request);
                    let _ = write_http_response(&mut stream, &response).await;
                }
            }
        });

        Self {
            base_url: format!("http://{addr}{BASE_PATH}"),
            routes,
            requests,
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queues `responses` for `route`, e.g. `"GET /conversations"`.
    pub fn route(&self, route: &str, responses: impl IntoIterator<Item = MockResponse>) {
        self.routes
            .lock()
            .expect("routes lock")
            .entry(route.to_string())
            .or_default()
            .extend(responses);
    }

    /// Answers the session probe with 200.
    pub fn accept_session(&self) {
        self.route(
            "GET /auth/session",
            [MockResponse::json(
                200,
                serde_json::json!({"user": {"id": "u1", "name": "Alice", "email": "alice@example.com"}}),
            )],
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn routes_hit(&self) -> Vec<String> {
        self.requests().iter().map(RecordedRequest::route).collect()
    }

    pub fn count(&self, route: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.route() == route)
            .count()
    }

    pub fn settings(&self) -> ApiSettings {
        ApiSettings::new(self.base_url.clone())
            .with_credentials(SessionCredentials::Bearer("test-token".to_string()))
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.settings()).expect("client should build")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn clear_proxy_env() {
    std::env::remove_var("HTTP_PROXY");
    std::env::remove_var("http_proxy");
    std::env::remove_var("HTTPS_PROXY");
    std::env::remove_var("https_proxy");
    std::env::remove_var("ALL_PROXY");
    std::env::remove_var("all_proxy");
    std::env::set_var("NO_PROXY", "*");
    std::env::set_var("no_proxy", "*");
}

fn next_response(routes: &Routes, route: &str) -> MockResponse {
    let mut routes = routes.lock().expect("routes lock");
    match routes.get_mut(route) {
        Some(queue) if queue.len() > 1 => queue.pop_front().expect("queue is non-empty"),
        Some(queue) if !queue.is_empty() => queue[0].clone(),
        _ => MockResponse::json(404, serde_json::json!({"error": format!("no route for {route}")})),
    }
}

async fn read_http_request(stream: &mut TcpStream) -> Result<RecordedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let path = target
        .strip_prefix(BASE_PATH)
        .unwrap_or(target)
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

async fn write_http_response(
    stream: &mut TcpStream,
    response: &MockResponse,
) -> std::io::Result<()> {
    let reason = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown");
    let length = if response.status == 204 {
        String::new()
    } else {
        let declared = response.declared_length.unwrap_or(response.body.len());
        format!("content-length: {declared}\r\n")
    };
    let raw = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\n{}connection: close\r\n\r\n{}",
        response.status, reason, length, response.body
    );
    stream.write_all(raw.as_bytes()).await?;
    stream.shutdown().await
}
