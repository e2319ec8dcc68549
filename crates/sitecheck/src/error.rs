//! Error types for site checks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteCheckError {
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Timed out after {seconds}s fetching {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Site not reachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Suite parse error: {0}")]
    SuiteParse(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SiteCheckError {
    /// Whether this error came from a request that could not complete.
    ///
    /// Network-class errors are recoverable inside a run; everything else is
    /// treated as unhandled by the harness.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

pub type SiteCheckResult<T> = Result<T, SiteCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_classification() {
        let timeout = SiteCheckError::Timeout {
            url: "http://localhost:4321/".into(),
            seconds: 20,
        };
        let refused = SiteCheckError::Network {
            url: "http://localhost:4321/".into(),
            message: "connection refused".into(),
        };
        assert!(timeout.is_network());
        assert!(refused.is_network());
        assert!(!SiteCheckError::SuiteParse("bad".into()).is_network());
        assert_eq!(
            timeout.to_string(),
            "Timed out after 20s fetching http://localhost:4321/"
        );
    }
}
