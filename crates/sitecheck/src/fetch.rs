//! Page fetching
//!
//! The harness only ever talks to a [`PageFetcher`]. [`HttpFetcher`] is the
//! real implementation on top of reqwest.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{SiteCheckError, SiteCheckResult};

/// Captured result of one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub status: u16,
    pub body: String,
    pub elapsed_ms: u64,
    pub final_url: String,
    /// Value of the `Content-Length` header, if the server sent one
    pub content_length: Option<u64>,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body size in whole kilobytes, rounded to nearest
    pub fn size_kb(&self) -> u64 {
        kilobytes(self.body.len() as u64)
    }
}

pub(crate) fn kilobytes(bytes: u64) -> u64 {
    (bytes + 512) / 1024
}

/// Resolve a path or asset reference against a base URL
pub fn resolve_url(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    if let Some(rest) = reference.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let base = base_url.trim_end_matches('/');
    if reference.starts_with('/') {
        format!("{base}{reference}")
    } else {
        format!("{base}/{reference}")
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Base URL that relative paths are resolved against
    fn base_url(&self) -> &str;

    /// Fetch an absolute URL
    async fn fetch_url(&self, url: &str) -> SiteCheckResult<FetchOutcome>;

    /// Fetch a path relative to the base URL
    async fn fetch_page(&self, path: &str) -> SiteCheckResult<FetchOutcome> {
        let url = resolve_url(self.base_url(), path);
        self.fetch_url(&url).await
    }
}

/// reqwest-backed fetcher with a per-request timeout
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SiteCheckResult<Self> {
        Self::with_user_agent(base_url, timeout, None)
    }

    pub fn with_user_agent(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> SiteCheckResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> SiteCheckError {
        if err.is_timeout() {
            SiteCheckError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs().max(1),
            }
        } else {
            SiteCheckError::Network {
                url: url.to_string(),
                message: root_cause(&err),
            }
        }
    }
}

/// reqwest wraps the interesting part (DNS, refused) a few sources deep
fn root_cause(err: &reqwest::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(next) = source.source() {
        source = next;
    }
    source.to_string()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_url(&self, url: &str) -> SiteCheckResult<FetchOutcome> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;
        // Timed to response headers; the body download is not counted.
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_length = response.content_length();
        let body = response.text().await.map_err(|e| self.classify(url, e))?;

        debug!(url, status, elapsed_ms, bytes = body.len(), "fetched");

        Ok(FetchOutcome {
            status,
            body,
            elapsed_ms,
            final_url,
            content_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/", "http://localhost:4321/" ; "root path")]
    #[test_case("/es/", "http://localhost:4321/es/" ; "nested path")]
    #[test_case("images/hero.webp", "http://localhost:4321/images/hero.webp" ; "relative reference")]
    #[test_case("https://cdn.example.com/a.png", "https://cdn.example.com/a.png" ; "absolute url")]
    #[test_case("//cdn.example.com/a.png", "https://cdn.example.com/a.png" ; "protocol relative")]
    fn resolves_references(reference: &str, expected: &str) {
        assert_eq!(resolve_url("http://localhost:4321/", reference), expected);
    }

    #[test]
    fn size_rounds_to_nearest_kb() {
        let outcome = FetchOutcome {
            status: 200,
            body: "x".repeat(1536),
            elapsed_ms: 0,
            final_url: String::new(),
            content_length: None,
        };
        assert_eq!(outcome.size_kb(), 2);
        assert_eq!(kilobytes(511), 0);
    }
}
