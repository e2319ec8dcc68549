//! Content assertions
//!
//! Every function here is pure: it inspects a body or a measured value and
//! returns exactly one [`TestResult`]. Recording it is the caller's job.

use regex::Regex;

use crate::result::TestResult;

/// Pass when `body` contains `needle`
pub fn contains(name: &str, body: &str, needle: &str) -> TestResult {
    TestResult::check(body.contains(needle), name)
}

/// Pass when every needle is present.
///
/// With `tally` the details always carry `found/total`; otherwise a failure
/// lists what was missing.
pub fn contains_all<S: AsRef<str>>(name: &str, body: &str, needles: &[S], tally: bool) -> TestResult {
    let missing: Vec<&str> = needles
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|n| !body.contains(n))
        .collect();
    let result = TestResult::check(missing.is_empty(), name);

    if tally {
        let found = needles.len() - missing.len();
        result.with_details(format!("{found}/{}", needles.len()))
    } else if missing.is_empty() {
        result
    } else {
        result.with_details(format!("missing: {}", missing.join(", ")))
    }
}

/// Pass when at least one needle is present
pub fn contains_any<S: AsRef<str>>(name: &str, body: &str, needles: &[S]) -> TestResult {
    let found = needles.iter().any(|n| body.contains(n.as_ref()));
    let result = TestResult::check(found, name);
    if found {
        result
    } else {
        result.with_details(format!("none of {} markers found", needles.len()))
    }
}

/// Pass when none of the needles appear
pub fn absent<S: AsRef<str>>(name: &str, body: &str, needles: &[S], ignore_case: bool) -> TestResult {
    let haystack = if ignore_case {
        body.to_lowercase()
    } else {
        body.to_string()
    };
    let found: Vec<&str> = needles
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|n| {
            if ignore_case {
                haystack.contains(&n.to_lowercase())
            } else {
                haystack.contains(n)
            }
        })
        .collect();

    let result = TestResult::check(found.is_empty(), name);
    if found.is_empty() {
        result
    } else {
        result.with_details(format!("found: {}", found.join(", ")))
    }
}

/// Pass when `pattern` matches; details show an excerpt of the first capture
/// group (or the whole match when the pattern has none).
pub fn matches(name: &str, body: &str, pattern: &Regex, excerpt: usize) -> TestResult {
    match first_capture(body, pattern) {
        Some(text) => TestResult::pass(name).with_details(truncate(text.trim(), excerpt)),
        None => TestResult::fail(name).with_details("missing"),
    }
}

/// Pass when the first capture's length in characters lies in `min..=max`
pub fn capture_len(
    name: &str,
    body: &str,
    pattern: &Regex,
    min: Option<usize>,
    max: Option<usize>,
) -> TestResult {
    match first_capture(body, pattern) {
        Some(text) => {
            let len = text.chars().count();
            let ok = min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m);
            TestResult::check(ok, name).with_details(format!("{len} chars"))
        }
        None => TestResult::fail(name).with_details("missing"),
    }
}

/// Pass when `min <= value <= max`
pub fn range(name: &str, value: u64, min: Option<u64>, max: Option<u64>, unit: &str) -> TestResult {
    let ok = min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m);
    TestResult::check(ok, name).with_details(format!("{value}{unit}"))
}

/// Pass when `value < limit`
pub fn under(name: &str, value: u64, limit: u64, unit: &str) -> TestResult {
    let result = TestResult::check(value < limit, name);
    if value < limit {
        result.with_details(format!("{value}{unit}"))
    } else {
        result.with_details(format!("{value}{unit} (limit {limit}{unit})"))
    }
}

/// Pass when at most `max` matches of `pattern` remain after dropping those
/// whose text contains `exclude`.
pub fn count_at_most(
    name: &str,
    body: &str,
    pattern: &Regex,
    exclude: Option<&str>,
    max: usize,
) -> TestResult {
    let count = count_matches(body, pattern, exclude);
    let result = TestResult::check(count <= max, name);
    if count == 0 {
        result
    } else {
        result.with_details(format!("{count} found"))
    }
}

pub(crate) fn count_matches(body: &str, pattern: &Regex, exclude: Option<&str>) -> usize {
    pattern
        .find_iter(body)
        .filter(|m| exclude.map_or(true, |e| !m.as_str().contains(e)))
        .count()
}

fn first_capture<'a>(body: &'a str, pattern: &Regex) -> Option<&'a str> {
    let caps = pattern.captures(body)?;
    caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
