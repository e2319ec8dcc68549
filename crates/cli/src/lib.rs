//! Shared plumbing for the `run-tests` and `site-snapshot` binaries

pub mod output;

use std::path::Path;

use sitecheck::{HarnessConfig, SiteCheckResult, SuiteSpec};
use tracing_subscriber::{fmt, EnvFilter};

/// Check catalogue compiled into `run-tests`
pub const DEFAULT_SUITE: &str = include_str!("../../../suites/site.yaml");

/// Install the tracing subscriber.
///
/// Logs go to stderr so the report on stdout stays readable; `RUST_LOG`
/// overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The configured suite file or directory, else the embedded catalogue
pub fn load_suite(config: &HarnessConfig) -> SiteCheckResult<SuiteSpec> {
    match config.suite_path.as_deref() {
        Some(path) => load_suite_from(path),
        None => SuiteSpec::from_yaml(DEFAULT_SUITE),
    }
}

fn load_suite_from(path: &Path) -> SiteCheckResult<SuiteSpec> {
    tracing::info!(path = %path.display(), "loading suite");
    SuiteSpec::load(path)
}
