//! Sitecheck smoke-test harness
//!
//! This crate runs ordered groups of content checks against a website and
//! reports pass/fail results on the console:
//! - Gates every run on a reachability fetch of the base path
//! - Fetches pages sequentially through a pluggable [`PageFetcher`]
//! - Parses declarative YAML suites into runnable groups
//! - Drives Playwright for one-off diagnostic snapshots
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Harness (Rust)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Harness::run(groups) -> RunOutcome                         │
//! │    ├── reachability check (fetch_page("/"))                 │
//! │    ├── for group: group.run(&mut GroupContext)              │
//! │    │     └── ctx.assert(TestResult) -> ResultSet + Reporter │
//! │    └── Reporter::finished(ResultSet, duration)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SuiteSpec (YAML)                                           │
//! │    ├── name, description                                    │
//! │    └── groups: [GroupSpec]                                  │
//! │          └── steps: [CheckStep]                             │
//! │                ├── load { path, label?, announce }          │
//! │                ├── probe / expect_status { path, ... }      │
//! │                ├── contains_all / contains_any / absent     │
//! │                ├── matches / count_at_most { pattern }      │
//! │                ├── load_time / html_size / average_load     │
//! │                └── assets { pattern, limit }                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assert;
pub mod browser;
pub mod checks;
pub mod config;
pub mod error;
pub mod fetch;
pub mod harness;
pub mod report;
pub mod result;
#[cfg(any(test, feature = "stub"))]
pub mod stub;
pub mod suite;

pub use config::{HarnessConfig, Target};
pub use error::{SiteCheckError, SiteCheckResult};
pub use fetch::{FetchOutcome, HttpFetcher, PageFetcher};
pub use harness::{GroupContext, Harness, HarnessOptions, RunOutcome, TestGroup};
pub use report::{ConsoleReporter, Reporter};
pub use result::{ResultSet, Status, TestResult};
#[cfg(any(test, feature = "stub"))]
pub use stub::StubFetcher;
pub use suite::{CheckStep, SuiteSpec};
