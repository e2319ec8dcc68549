//! Sequential test harness
//!
//! A run is a single pass through an ordered list of [`TestGroup`]s, gated by
//! one reachability fetch of the base path:
//!
//! ```text
//! NotStarted -> ReachabilityCheck -> Aborted
//!                                 -> Running -> Summarized
//! ```
//!
//! Nothing runs concurrently. Each group gets a [`GroupContext`] that borrows
//! the fetcher, the run's [`ResultSet`] and the reporter for as long as the
//! group executes.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::error::{SiteCheckError, SiteCheckResult};
use crate::fetch::{FetchOutcome, PageFetcher};
use crate::report::Reporter;
use crate::result::{ResultSet, Status, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    ReachabilityCheck,
    Aborted,
    Running,
    Summarized,
}

impl RunPhase {
    fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (NotStarted, ReachabilityCheck)
                | (ReachabilityCheck, Aborted)
                | (ReachabilityCheck, Running)
                | (Running, Summarized)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::NotStarted => "not_started",
            RunPhase::ReachabilityCheck => "reachability_check",
            RunPhase::Aborted => "aborted",
            RunPhase::Running => "running",
            RunPhase::Summarized => "summarized",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the reachability check stopped the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Status(u16),
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    pub url: String,
    pub reason: AbortReason,
    pub remediation: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: ResultSet,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Aborted(Abort),
    Completed(RunReport),
}

impl RunOutcome {
    /// Process exit status: 0 only for a completed run with no failures
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Aborted(_) => 1,
            RunOutcome::Completed(report) if report.results.failed > 0 => 1,
            RunOutcome::Completed(_) => 0,
        }
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match self {
            RunOutcome::Completed(report) => Some(&report.results),
            RunOutcome::Aborted(_) => None,
        }
    }
}

/// Presentation and gating settings for a run
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub title: String,
    pub reachability_path: String,
    pub remediation: String,
}

impl HarnessOptions {
    pub fn from_config(config: &HarnessConfig, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reachability_path: config.reachability_path.clone(),
            remediation: config.remediation.clone(),
        }
    }
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default(), "Site checks")
    }
}

/// A named bundle of assertions
#[async_trait]
pub trait TestGroup: Send + Sync {
    fn name(&self) -> &str;

    fn icon(&self) -> &str {
        "•"
    }

    /// Run the group's assertions. Returning a network-class error ends the
    /// group early; the harness records it and moves on.
    async fn run(&self, ctx: &mut GroupContext<'_>) -> SiteCheckResult<()>;
}

/// What a group sees while it runs
pub struct GroupContext<'a> {
    fetcher: &'a dyn PageFetcher,
    results: &'a mut ResultSet,
    reporter: &'a mut dyn Reporter,
}

impl<'a> GroupContext<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        results: &'a mut ResultSet,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            fetcher,
            results,
            reporter,
        }
    }

    pub fn base_url(&self) -> &str {
        self.fetcher.base_url()
    }

    pub async fn fetch_page(&self, path: &str) -> SiteCheckResult<FetchOutcome> {
        self.fetcher.fetch_page(path).await
    }

    pub async fn fetch_url(&self, url: &str) -> SiteCheckResult<FetchOutcome> {
        self.fetcher.fetch_url(url).await
    }

    pub fn record(&mut self, status: Status, name: impl Into<String>, details: Option<String>) {
        self.assert(TestResult::new(status, name, details));
    }

    /// Record the result of an assertion
    pub fn assert(&mut self, result: TestResult) {
        debug!(status = ?result.status, name = %result.name, "recorded");
        self.reporter.recorded(&result);
        self.results.push(result);
    }

    pub fn results(&self) -> &ResultSet {
        &*self.results
    }
}

pub struct Harness<F, R> {
    fetcher: F,
    reporter: R,
    options: HarnessOptions,
    phase: RunPhase,
}

impl<F: PageFetcher, R: Reporter> Harness<F, R> {
    pub fn new(fetcher: F, reporter: R, options: HarnessOptions) -> Self {
        Self {
            fetcher,
            reporter,
            options,
            phase: RunPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    fn advance(&mut self, next: RunPhase) -> SiteCheckResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(SiteCheckError::InvalidStateTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.phase, to = %next, "harness phase");
        self.phase = next;
        Ok(())
    }

    /// Run every group in order and summarize.
    ///
    /// `Err` is reserved for failures the run cannot absorb; everything a
    /// group can hit on the network ends up as a recorded result instead.
    pub async fn run(&mut self, groups: &[Box<dyn TestGroup>]) -> SiteCheckResult<RunOutcome> {
        self.advance(RunPhase::ReachabilityCheck)?;
        let start = Instant::now();
        let base_url = self.fetcher.base_url().to_string();
        self.reporter.run_started(&self.options.title, &base_url);

        let reason = match self.fetcher.fetch_page(&self.options.reachability_path).await {
            Ok(outcome) if outcome.is_success() => None,
            Ok(outcome) => Some(AbortReason::Status(outcome.status)),
            Err(e) if e.is_network() => Some(AbortReason::Network(e.to_string())),
            Err(e) => return Err(e),
        };

        if let Some(reason) = reason {
            self.advance(RunPhase::Aborted)?;
            warn!(url = %base_url, ?reason, "reachability check failed, aborting run");
            let abort = Abort {
                url: base_url,
                reason,
                remediation: self.options.remediation.clone(),
            };
            self.reporter.aborted(&abort);
            return Ok(RunOutcome::Aborted(abort));
        }

        info!(url = %base_url, groups = groups.len(), "site reachable, running checks");
        self.advance(RunPhase::Running)?;

        let mut results = ResultSet::new();
        for group in groups {
            self.reporter.group_started(group.icon(), group.name());

            let outcome = {
                let mut ctx = GroupContext::new(&self.fetcher, &mut results, &mut self.reporter);
                group.run(&mut ctx).await
            };

            match outcome {
                Ok(()) => {}
                Err(e) if e.is_network() => {
                    warn!(group = group.name(), error = %e, "group ended by network error");
                    let result = TestResult::fail(format!("{}: group completed", group.name()))
                        .with_details(e.to_string());
                    self.reporter.recorded(&result);
                    results.push(result);
                }
                Err(e) => return Err(e),
            }

            self.reporter.group_finished(group.name());
        }

        let duration = start.elapsed();
        self.advance(RunPhase::Summarized)?;
        info!(
            passed = results.passed,
            failed = results.failed,
            skipped = results.skipped,
            duration_ms = duration.as_millis() as u64,
            "run finished"
        );
        self.reporter.finished(&results, duration);

        Ok(RunOutcome::Completed(RunReport { results, duration }))
    }
}
