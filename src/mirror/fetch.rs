// src/mirror/fetch.rs
// =============================================================================
// This module downloads things over HTTP.
//
// Every page and every asset goes through one shared `Fetcher`:
// - One reqwest Client (connection pooling across all tasks)
// - Plain GET requests, default redirect handling, no cookies
// - Responses are fully buffered before we look at them
// - An optional semaphore caps how many requests are in flight at once
//
// Rust concepts:
// - Clone: Client and Arc are cheap to clone (reference counted)
// - thiserror: Typed errors that still work with `?`
// - Semaphore: An async "N tickets" gate from tokio
// =============================================================================

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

// Everything that can go wrong while downloading one URL
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, TLS error...
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered, but not with a 2xx status
    #[error("HTTP {0}")]
    Status(StatusCode),

    /// The connection broke while we were reading the body
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

// Shared HTTP downloader
//
// Cloning a Fetcher is cheap: clones share the same connection pool and
// the same concurrency limit.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    // None = no limit (one request per discovered resource, all at once)
    limiter: Option<Arc<Semaphore>>,
}

impl Fetcher {
    // Creates a fetcher
    //
    // Parameters:
    //   timeout: per-request timeout (covers connect + body)
    //   max_concurrency: maximum simultaneous requests, None for unlimited
    pub fn new(timeout: Duration, max_concurrency: Option<usize>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            limiter: max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
        })
    }

    // Downloads a URL and returns the whole body
    //
    // Non-2xx statuses are errors; the body of an error page is discarded.
    pub async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        // Hold a permit (if limited) only while this request is running.
        // The semaphore is never closed, so acquire() can't fail.
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await.map_err(FetchError::Body)?;
        Ok(body.to_vec())
    }
}
