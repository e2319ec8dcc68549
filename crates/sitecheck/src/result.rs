//! Recorded assertion results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Skip,
    /// Informational note; logged in order but not counted as a test
    Info,
}

impl Status {
    pub fn glyph(&self) -> &'static str {
        match self {
            Status::Pass => "✅",
            Status::Fail => "❌",
            Status::Skip => "⏭️",
            Status::Info => "ℹ️",
        }
    }

    pub fn is_counted(&self) -> bool {
        !matches!(self, Status::Info)
    }
}

/// Outcome of a single assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: Status,
    pub name: String,
    pub details: Option<String>,
}

impl TestResult {
    pub fn new(status: Status, name: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            name: name.into(),
            details: details.filter(|d| !d.is_empty()),
        }
    }

    pub fn pass(name: impl Into<String>) -> Self {
        Self::new(Status::Pass, name, None)
    }

    pub fn fail(name: impl Into<String>) -> Self {
        Self::new(Status::Fail, name, None)
    }

    pub fn skip(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(Status::Skip, name, Some(details.into()))
    }

    pub fn info(name: impl Into<String>) -> Self {
        Self::new(Status::Info, name, None)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.details = (!details.is_empty()).then_some(details);
        self
    }

    /// Pass or fail depending on `ok`
    pub fn check(ok: bool, name: impl Into<String>) -> Self {
        if ok {
            Self::pass(name)
        } else {
            Self::fail(name)
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Aggregate results of one run, in execution order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    entries: Vec<TestResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result and bump the matching counter
    pub fn push(&mut self, result: TestResult) {
        match result.status {
            Status::Pass => self.passed += 1,
            Status::Fail => self.failed += 1,
            Status::Skip => self.skipped += 1,
            Status::Info => {}
        }
        self.entries.push(result);
    }

    pub fn record(&mut self, status: Status, name: impl Into<String>, details: Option<String>) {
        self.push(TestResult::new(status, name, details));
    }

    /// Number of counted tests (info notes excluded)
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|r| r.status.is_counted()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every recorded entry including info notes
    pub fn entries(&self) -> &[TestResult] {
        &self.entries
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.entries.iter().filter(|r| r.status == Status::Fail)
    }

    /// passed / (passed + failed) as a percentage; 0 when nothing was decided
    pub fn pass_rate(&self) -> f64 {
        let decided = self.passed + self.failed;
        if decided == 0 {
            0.0
        } else {
            self.passed as f64 / decided as f64 * 100.0
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut set = ResultSet::new();
        set.push(TestResult::pass("Homepage loads"));
        set.push(TestResult::info("Found 4 image references"));
        set.push(TestResult::fail("Hero headline present").with_details("missing"));
        set.push(TestResult::skip("404 handling", "connection refused"));
        set.record(Status::Pass, "Canonical URL set", None);
        set
    }

    #[test]
    fn counters_match_counted_entries() {
        let set = sample();
        assert_eq!((set.passed, set.failed, set.skipped), (2, 1, 1));
        assert_eq!(set.passed + set.failed + set.skipped, set.len());
        assert_eq!(set.entries().len(), 5);
    }

    #[test]
    fn failures_keep_order_and_details() {
        let set = sample();
        let failed: Vec<_> = set.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "Hero headline present");
        assert_eq!(failed[0].details.as_deref(), Some("missing"));
    }

    #[test]
    fn pass_rate_bounds() {
        let empty = ResultSet::new();
        assert_eq!(empty.pass_rate(), 0.0);

        let mut skips_only = ResultSet::new();
        skips_only.push(TestResult::skip("a", "b"));
        assert_eq!(skips_only.pass_rate(), 0.0);
        assert!(skips_only.all_passed());

        let set = sample();
        let rate = set.pass_rate();
        assert!((rate - 66.666).abs() < 0.01, "rate was {rate}");
        assert!((0.0..=100.0).contains(&rate));
    }

    #[test]
    fn empty_details_are_dropped() {
        let result = TestResult::pass("x").with_details("");
        assert_eq!(result.details, None);
        assert_eq!(TestResult::new(Status::Fail, "y", Some(String::new())).details, None);
    }
}
