// src/testing.rs
// =============================================================================
// A tiny in-process HTTP server for tests.
//
// It serves a fixed table of routes on 127.0.0.1 (random port), answers
// anything else with 404, and counts how many times each path was requested.
// It also remembers the name of every request header it has seen.
// That lets crawl tests check exactly which URLs were fetched, without
// touching the internet.
// =============================================================================

use dashmap::{DashMap, DashSet};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use url::Url;

// One canned response
#[derive(Debug, Clone)]
pub struct Route {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl Route {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
            delay: None,
        }
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::ok("text/html; charset=utf-8", body)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
            delay: None,
        }
    }

    // Wait before answering, so callers really have to wait for us
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub struct FixtureServer {
    addr: SocketAddr,
    hits: Arc<DashMap<String, usize>>,
    header_names: Arc<DashSet<String>>,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let hits = Arc::new(DashMap::new());
        let header_names = Arc::new(DashSet::new());

        let handle = {
            let hits = Arc::clone(&hits);
            let header_names = Arc::clone(&header_names);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(
                        stream,
                        Arc::clone(&routes),
                        Arc::clone(&hits),
                        Arc::clone(&header_names),
                    ));
                }
            })
        };

        Self {
            addr,
            hits,
            header_names,
            handle,
        }
    }

    // URL on this server, e.g. url("/index.html")
    pub fn url(&self, path: &str) -> Url {
        self.url_with_host("127.0.0.1", path)
    }

    // Same server, but addressed through a different host name
    pub fn url_with_host(&self, host: &str, path: &str) -> Url {
        Url::parse(&format!("http://{}:{}{}", host, self.addr.port(), path)).unwrap()
    }

    // How many requests hit this path (including query string)
    pub fn hits(&self, path: &str) -> usize {
        self.hits.get(path).map(|count| *count).unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|entry| *entry.value()).sum()
    }

    // True if any request so far carried this header (case-insensitive)
    pub fn saw_header(&self, name: &str) -> bool {
        self.header_names.contains(&name.to_ascii_lowercase())
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: Arc<HashMap<String, Route>>,
    hits: Arc<DashMap<String, usize>>,
    header_names: Arc<DashSet<String>>,
) {
    let path = {
        let mut reader = BufReader::new(&mut stream);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.is_err() {
            return;
        }

        // Skip headers until the blank line
        loop {
            let mut header = String::new();
            match reader.read_line(&mut header).await {
                Ok(0) | Err(_) => break,
                Ok(_) if header == "\r\n" || header == "\n" => break,
                Ok(_) => {
                    if let Some((name, _)) = header.split_once(':') {
                        header_names.insert(name.trim().to_ascii_lowercase());
                    }
                }
            }
        }

        // "GET /path HTTP/1.1"
        request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or("/")
            .to_string()
    };

    *hits.entry(path.clone()).or_insert(0) += 1;

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }

    let reason = StatusCode::from_u16(route.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown");

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason,
        route.content_type,
        route.body.len()
    );

    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&route.body).await;
    let _ = stream.shutdown().await;
}
