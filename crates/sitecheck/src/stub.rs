//! Canned fetcher for exercising groups without a network
//!
//! Compiled for this crate's tests and, behind the `stub` feature, for
//! downstream crates that want to drive a [`Harness`](crate::Harness) offline.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{SiteCheckError, SiteCheckResult};
use crate::fetch::{resolve_url, FetchOutcome, PageFetcher};

/// Canned response served by [`StubFetcher`]
#[derive(Debug, Clone)]
pub enum StubResponse {
    Page {
        status: u16,
        body: String,
        elapsed_ms: u64,
        content_length: Option<u64>,
    },
    Refused,
    Timeout,
}

/// In-memory fetcher keyed by absolute URL. Unknown URLs answer 404.
pub struct StubFetcher {
    base_url: String,
    routes: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn route(mut self, path: &str, response: StubResponse) -> Self {
        self.routes.insert(resolve_url(&self.base_url, path), response);
        self
    }

    /// Serve `body` with `status` at `path`
    pub fn page(self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.route(
            path,
            StubResponse::Page {
                status,
                body: body.into(),
                elapsed_ms: 5,
                content_length: None,
            },
        )
    }

    /// Serve a 200 page that reports a given load time
    pub fn slow_page(self, path: &str, body: impl Into<String>, elapsed_ms: u64) -> Self {
        self.route(
            path,
            StubResponse::Page {
                status: 200,
                body: body.into(),
                elapsed_ms,
                content_length: None,
            },
        )
    }

    /// Serve a 200 asset of `bytes` length with a `Content-Length` header
    pub fn asset(self, path: &str, bytes: u64) -> Self {
        self.route(
            path,
            StubResponse::Page {
                status: 200,
                body: String::new(),
                elapsed_ms: 1,
                content_length: Some(bytes),
            },
        )
    }

    pub fn refused(self, path: &str) -> Self {
        self.route(path, StubResponse::Refused)
    }

    pub fn timeout(self, path: &str) -> Self {
        self.route(path, StubResponse::Timeout)
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_url(&self, url: &str) -> SiteCheckResult<FetchOutcome> {
        self.requests.lock().push(url.to_string());

        match self.routes.get(url) {
            Some(StubResponse::Page {
                status,
                body,
                elapsed_ms,
                content_length,
            }) => Ok(FetchOutcome {
                status: *status,
                body: body.clone(),
                elapsed_ms: *elapsed_ms,
                final_url: url.to_string(),
                content_length: *content_length,
            }),
            Some(StubResponse::Refused) => Err(SiteCheckError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
            Some(StubResponse::Timeout) => Err(SiteCheckError::Timeout {
                url: url.to_string(),
                seconds: 20,
            }),
            None => Ok(FetchOutcome {
                status: 404,
                body: String::new(),
                elapsed_ms: 1,
                final_url: url.to_string(),
                content_length: None,
            }),
        }
    }
}
