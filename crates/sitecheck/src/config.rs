//! Harness configuration
//!
//! Values come from an optional TOML file and are then overridden by
//! `SITECHECK_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SiteCheckError, SiteCheckResult};

pub const CONFIG_ENV: &str = "SITECHECK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "sitecheck.toml";

const MAX_TIMEOUT_SECS: u64 = 120;

/// Which deployment of the site a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Local,
    Live,
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the local dev server
    pub local_url: String,

    /// Base URL of the deployed site
    pub live_url: String,

    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,

    /// Path fetched by the reachability check
    pub reachability_path: String,

    /// Suite file or directory (None = built-in suite)
    pub suite_path: Option<PathBuf>,

    /// User agent sent with every request
    pub user_agent: Option<String>,

    /// Printed when the reachability check fails
    pub remediation: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            local_url: "http://localhost:4321".to_string(),
            live_url: "https://bealer-insurance-site.pages.dev".to_string(),
            timeout_secs: 20,
            reachability_path: "/".to_string(),
            suite_path: None,
            user_agent: None,
            remediation: "If testing locally, make sure dev server is running: npm run dev"
                .to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> SiteCheckResult<Self> {
        Self::load_with(path, |_| None)
    }

    /// Load from `SITECHECK_CONFIG` (or `sitecheck.toml`) and apply env overrides
    pub fn from_env() -> SiteCheckResult<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_with(&path, |key| std::env::var(key).ok())
    }

    /// Read the file, then apply overrides. Validation runs once, on the merged result.
    pub fn load_with<F>(path: &Path, lookup: F) -> SiteCheckResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `SITECHECK_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SiteCheckResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("SITECHECK_LOCAL_URL") {
            self.local_url = url;
        }
        if let Some(url) = non_empty("SITECHECK_LIVE_URL") {
            self.live_url = url;
        }
        if let Some(secs) = non_empty("SITECHECK_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                SiteCheckError::InvalidConfig(format!("SITECHECK_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        if let Some(suite) = non_empty("SITECHECK_SUITE") {
            self.suite_path = Some(PathBuf::from(suite));
        }
        if let Some(agent) = non_empty("SITECHECK_USER_AGENT") {
            self.user_agent = Some(agent);
        }

        self.validate()
    }

    pub fn validate(&self) -> SiteCheckResult<()> {
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(SiteCheckError::InvalidConfig(format!(
                "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {}",
                self.timeout_secs
            )));
        }
        for url in [&self.local_url, &self.live_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SiteCheckError::InvalidConfig(format!(
                    "base URL must be http(s): {url}"
                )));
            }
        }
        if !self.reachability_path.starts_with('/') {
            return Err(SiteCheckError::InvalidConfig(format!(
                "reachability_path must start with '/': {}",
                self.reachability_path
            )));
        }
        Ok(())
    }

    /// Base URL for a target, without a trailing slash
    pub fn base_url(&self, target: Target) -> &str {
        let url = match target {
            Target::Local => &self.local_url,
            Target::Live => &self.live_url,
        };
        url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.base_url(Target::Local), "http://localhost:4321");
        assert_eq!(config.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitecheck.toml");
        std::fs::write(
            &path,
            "live_url = \"https://example.pages.dev/\"\ntimeout_secs = 15\n",
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.base_url(Target::Live), "https://example.pages.dev");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.reachability_path, "/");
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("SITECHECK_LOCAL_URL", "http://127.0.0.1:4322"),
            ("SITECHECK_TIMEOUT_SECS", "30"),
            ("SITECHECK_SUITE", "suites/custom.yaml"),
            ("SITECHECK_USER_AGENT", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = HarnessConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url(Target::Local), "http://127.0.0.1:4322");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.suite_path, Some(PathBuf::from("suites/custom.yaml")));
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn env_can_repair_a_bad_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitecheck.toml");
        std::fs::write(&path, "timeout_secs = 0\n").unwrap();

        assert!(matches!(
            HarnessConfig::load(&path),
            Err(SiteCheckError::InvalidConfig(_))
        ));

        let config = HarnessConfig::load_with(&path, |k| {
            (k == "SITECHECK_TIMEOUT_SECS").then(|| "45".to_string())
        })
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let mut config = HarnessConfig::default();
        let err = config
            .apply_overrides(|k| (k == "SITECHECK_TIMEOUT_SECS").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, SiteCheckError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_http_url() {
        let config = HarnessConfig {
            local_url: "localhost:4321".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
