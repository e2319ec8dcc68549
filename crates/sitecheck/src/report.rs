//! Console reporting
//!
//! The harness pushes every event through a [`Reporter`]. [`ConsoleReporter`]
//! writes the human-readable transcript; it is the only artifact a run leaves.

use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use colored::Colorize;

use crate::harness::{Abort, AbortReason};
use crate::result::{ResultSet, Status, TestResult};

const RULE_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 40;

pub trait Reporter: Send + Sync {
    fn run_started(&mut self, title: &str, base_url: &str);
    fn group_started(&mut self, icon: &str, name: &str);
    fn recorded(&mut self, result: &TestResult);
    fn group_finished(&mut self, name: &str);
    fn aborted(&mut self, abort: &Abort);
    fn finished(&mut self, results: &ResultSet, duration: Duration);
}

/// One transcript line for a recorded result
pub fn format_result(result: &TestResult) -> String {
    match &result.details {
        Some(details) => format!("{} {} - {}", result.status.glyph(), result.name, details),
        None => format!("{} {}", result.status.glyph(), result.name),
    }
}

/// Summary block printed after the last group
pub fn render_summary(results: &ResultSet, duration: Duration, color: bool) -> String {
    let paint = |text: String, status: Status| -> String {
        if !color {
            return text;
        }
        match status {
            Status::Pass => text.green().to_string(),
            Status::Fail => text.red().to_string(),
            Status::Skip => text.yellow().to_string(),
            Status::Info => text,
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "\n📊 TEST SUMMARY\n");
    let _ = writeln!(out, "   ✅ Passed:  {}", paint(results.passed.to_string(), Status::Pass));
    let _ = writeln!(out, "   ❌ Failed:  {}", paint(results.failed.to_string(), Status::Fail));
    let _ = writeln!(out, "   ⏭️  Skipped: {}", paint(results.skipped.to_string(), Status::Skip));
    let _ = writeln!(out, "   ⏱️  Duration: {:.2}s", duration.as_secs_f64());
    let _ = writeln!(out);

    let rate = results.pass_rate();
    if results.all_passed() {
        let _ = writeln!(out, "🎉 All tests passed! ({rate:.1}% pass rate)\n");
    } else {
        let headline = format!("{} test(s) failed", results.failed);
        let _ = writeln!(out, "⚠️  {} ({rate:.1}% pass rate)\n", paint(headline, Status::Fail));
        let _ = writeln!(out, "Failed tests:");
        for failure in results.failures() {
            match &failure.details {
                Some(details) => {
                    let _ = writeln!(out, "   • {}: {}", failure.name, details);
                }
                None => {
                    let _ = writeln!(out, "   • {}", failure.name);
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

/// Lines printed when the reachability check fails
pub fn render_abort(abort: &Abort) -> String {
    let mut out = String::new();
    match &abort.reason {
        AbortReason::Status(status) => {
            let _ = writeln!(out, "❌ Site not reachable at {} (status {status})", abort.url);
        }
        AbortReason::Network(message) => {
            let _ = writeln!(out, "❌ Cannot connect to {}", abort.url);
            let _ = writeln!(out, "   Error: {message}");
        }
    }
    let _ = writeln!(out, "   {}\n", abort.remediation);
    out
}

/// Plain-text transcript writer
pub struct ConsoleReporter<W: Write + Send + Sync> {
    out: W,
    color: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write + Send + Sync> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A closed stdout must not take the run down with it.
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write + Send + Sync> Reporter for ConsoleReporter<W> {
    fn run_started(&mut self, title: &str, base_url: &str) {
        let text = format!(
            "\n🧪 {title}\n📍 Testing: {base_url}\n\n{}\n\n",
            "=".repeat(RULE_WIDTH)
        );
        self.emit(&text);
    }

    fn group_started(&mut self, icon: &str, name: &str) {
        let header = format!("{icon} {}", name.to_uppercase());
        let header = if self.color {
            header.bold().to_string()
        } else {
            header
        };
        self.emit(&format!("{header}\n{}\n", "-".repeat(SECTION_WIDTH)));
    }

    fn recorded(&mut self, result: &TestResult) {
        let line = format_result(result);
        self.emit(&format!("{line}\n"));
    }

    fn group_finished(&mut self, _name: &str) {
        self.emit("\n");
    }

    fn aborted(&mut self, abort: &Abort) {
        let text = render_abort(abort);
        self.emit(&text);
    }

    fn finished(&mut self, results: &ResultSet, duration: Duration) {
        let text = render_summary(results, duration, self.color);
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_lines() {
        assert_eq!(format_result(&TestResult::pass("Canonical URL set")), "✅ Canonical URL set");
        assert_eq!(
            format_result(&TestResult::fail("Homepage loads").with_details("Status: 500")),
            "❌ Homepage loads - Status: 500"
        );
        assert_eq!(
            format_result(&TestResult::skip("404 handling", "connection refused")),
            "⏭️ 404 handling - connection refused"
        );
    }

    #[test]
    fn summary_lists_failures_in_order() {
        let mut results = ResultSet::new();
        results.push(TestResult::pass("a"));
        results.push(TestResult::fail("b").with_details("Status: 404"));
        results.push(TestResult::pass("c"));
        results.push(TestResult::fail("d"));

        let text = render_summary(&results, Duration::from_millis(1234), false);
        assert!(text.contains("   ✅ Passed:  2"));
        assert!(text.contains("   ❌ Failed:  2"));
        assert!(text.contains("Duration: 1.23s"));
        assert!(text.contains("⚠️  2 test(s) failed (50.0% pass rate)"));
        let b = text.find("   • b: Status: 404").unwrap();
        let d = text.find("   • d\n").unwrap();
        assert!(b < d);
    }

    #[test]
    fn summary_with_nothing_decided() {
        let text = render_summary(&ResultSet::new(), Duration::ZERO, false);
        assert!(text.contains("🎉 All tests passed! (0.0% pass rate)"));
        assert!(!text.contains("Failed tests:"));
    }

    #[test]
    fn abort_messages() {
        let refused = Abort {
            url: "http://localhost:4321".into(),
            reason: AbortReason::Network("connection refused".into()),
            remediation: "start the dev server".into(),
        };
        let text = render_abort(&refused);
        assert!(text.starts_with("❌ Cannot connect to http://localhost:4321\n"));
        assert!(text.contains("   Error: connection refused"));
        assert!(text.contains("   start the dev server"));

        let broken = Abort {
            reason: AbortReason::Status(500),
            ..refused
        };
        assert!(render_abort(&broken).starts_with("❌ Site not reachable at http://localhost:4321 (status 500)"));
    }

    #[test]
    fn console_transcript() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false);
        reporter.group_started("🔍", "SEO tests");
        reporter.recorded(&TestResult::pass("Canonical URL set"));
        reporter.group_finished("SEO tests");

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            text,
            format!("🔍 SEO TESTS\n{}\n✅ Canonical URL set\n\n", "-".repeat(40))
        );
    }
}
