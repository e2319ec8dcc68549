//! Executes declarative groups
//!
//! A [`SpecGroup`] walks its steps in order, keeping the most recently loaded
//! page as the subject of content checks. Page loads gate the rest of the
//! group; everything else records a result and carries on.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::assert;
use crate::error::SiteCheckResult;
use crate::fetch::{kilobytes, resolve_url, FetchOutcome};
use crate::harness::{GroupContext, TestGroup};
use crate::result::TestResult;
use crate::suite::{CheckStep, GroupSpec};

enum Flow {
    Continue,
    Stop,
}

/// Group state carried between steps
#[derive(Default)]
struct GroupState {
    page: Option<FetchOutcome>,
    load_times: Vec<u64>,
}

pub struct SpecGroup {
    spec: GroupSpec,
}

impl SpecGroup {
    pub fn new(spec: GroupSpec) -> Self {
        Self { spec }
    }

    async fn run_step(
        &self,
        step: &CheckStep,
        ctx: &mut GroupContext<'_>,
        state: &mut GroupState,
    ) -> SiteCheckResult<Flow> {
        let name = step.name();

        match step {
            CheckStep::Load { path, announce, .. } => {
                return load(ctx, state, path, &name, *announce).await;
            }
            CheckStep::Probe {
                path,
                body_contains,
                ..
            } => {
                let result = match ctx.fetch_page(path).await {
                    Ok(o) if !o.is_success() => {
                        TestResult::fail(&name).with_details(format!("Status: {}", o.status))
                    }
                    Ok(o) => match body_contains {
                        Some(needle) if !o.body.contains(needle.as_str()) => {
                            TestResult::fail(&name).with_details(format!("missing '{needle}'"))
                        }
                        _ => TestResult::pass(&name).with_details(format!("{}ms", o.elapsed_ms)),
                    },
                    Err(e) if e.is_network() => TestResult::fail(&name).with_details(e.to_string()),
                    Err(e) => return Err(e),
                };
                ctx.assert(result);
            }
            CheckStep::ExpectStatus { path, status, .. } => {
                let result = match ctx.fetch_page(path).await {
                    Ok(o) if o.status == *status => TestResult::pass(&name),
                    Ok(o) => TestResult::info(&name).with_details(format!("Status: {}", o.status)),
                    Err(e) if e.is_network() => TestResult::skip(&name, e.to_string()),
                    Err(e) => return Err(e),
                };
                ctx.assert(result);
            }
            CheckStep::AverageLoad {
                pass_under_ms,
                info_under_ms,
                ..
            } => {
                ctx.assert(average_load(&name, &state.load_times, *pass_under_ms, *info_under_ms));
            }
            CheckStep::Assets { pattern, limit } => {
                let Some(page) = state.page.as_ref() else {
                    ctx.assert(TestResult::skip(&name, "no page loaded"));
                    return Ok(Flow::Continue);
                };
                assets(ctx, page, pattern, *limit).await?;
            }
            content => {
                let result = match state.page.as_ref() {
                    Some(page) => check_content(content, &name, page)?,
                    None => TestResult::skip(&name, "no page loaded"),
                };
                ctx.assert(result);
            }
        }

        Ok(Flow::Continue)
    }
}

#[async_trait]
impl TestGroup for SpecGroup {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn icon(&self) -> &str {
        &self.spec.icon
    }

    async fn run(&self, ctx: &mut GroupContext<'_>) -> SiteCheckResult<()> {
        let mut state = GroupState::default();
        for step in &self.spec.steps {
            if let Flow::Stop = self.run_step(step, ctx, &mut state).await? {
                debug!(group = %self.spec.name, step = %step.name(), "prerequisite failed, ending group");
                break;
            }
        }
        Ok(())
    }
}

async fn load(
    ctx: &mut GroupContext<'_>,
    state: &mut GroupState,
    path: &str,
    name: &str,
    announce: bool,
) -> SiteCheckResult<Flow> {
    match ctx.fetch_page(path).await {
        Ok(outcome) if outcome.is_success() => {
            if announce {
                ctx.assert(TestResult::pass(name).with_details(format!("{}ms", outcome.elapsed_ms)));
            }
            state.load_times.push(outcome.elapsed_ms);
            state.page = Some(outcome);
            Ok(Flow::Continue)
        }
        Ok(outcome) => {
            ctx.assert(TestResult::fail(name).with_details(format!("Status: {}", outcome.status)));
            Ok(Flow::Stop)
        }
        Err(e) if e.is_network() => {
            ctx.assert(TestResult::fail(name).with_details(e.to_string()));
            Ok(Flow::Stop)
        }
        Err(e) => Err(e),
    }
}

/// Checks that only look at the current page
fn check_content(step: &CheckStep, name: &str, page: &FetchOutcome) -> SiteCheckResult<TestResult> {
    let body = page.body.as_str();
    let result = match step {
        CheckStep::ContainsAll { needles, tally, .. } => {
            assert::contains_all(name, body, needles, *tally)
        }
        CheckStep::ContainsAny { needles, .. } => assert::contains_any(name, body, needles),
        CheckStep::Absent {
            needles,
            ignore_case,
            ..
        } => assert::absent(name, body, needles, *ignore_case),
        CheckStep::Matches {
            pattern,
            min_len,
            max_len,
            excerpt,
            ..
        } => {
            let re = Regex::new(pattern)?;
            if min_len.is_some() || max_len.is_some() {
                assert::capture_len(name, body, &re, *min_len, *max_len)
            } else {
                assert::matches(name, body, &re, *excerpt)
            }
        }
        CheckStep::CountAtMost {
            pattern,
            exclude,
            max,
            ..
        } => {
            let re = Regex::new(pattern)?;
            assert::count_at_most(name, body, &re, exclude.as_deref(), *max)
        }
        CheckStep::LoadTime { under_ms, .. } => assert::under(name, page.elapsed_ms, *under_ms, "ms"),
        CheckStep::HtmlSize { under_kb, .. } => assert::under(name, page.size_kb(), *under_kb, "KB"),
        other => unreachable!("{} is not a content check", other.name()),
    };
    Ok(result)
}

fn average_load(name: &str, load_times: &[u64], pass_under_ms: u64, info_under_ms: u64) -> TestResult {
    if load_times.is_empty() {
        return TestResult::skip(name, "no pages loaded");
    }
    let total: u64 = load_times.iter().sum();
    let count = load_times.len() as u64;
    let average = (total + count / 2) / count;

    let result = if average < pass_under_ms {
        TestResult::pass(name)
    } else if average < info_under_ms {
        TestResult::info(name)
    } else {
        TestResult::fail(name)
    };
    result.with_details(format!("{average}ms"))
}

async fn assets(
    ctx: &mut GroupContext<'_>,
    page: &FetchOutcome,
    pattern: &str,
    limit: usize,
) -> SiteCheckResult<()> {
    let re = Regex::new(pattern)?;
    let references: Vec<&str> = re
        .captures_iter(&page.body)
        .filter_map(|c| c.get(1).or_else(|| c.get(0)))
        .map(|m| m.as_str())
        .collect();

    ctx.assert(TestResult::info(format!("Found {} asset references", references.len())));

    for src in references.into_iter().take(limit) {
        let url = resolve_url(ctx.base_url(), src);
        let file = src.rsplit('/').next().unwrap_or(src);
        let name = format!("Asset loads: {file}");

        let result = match ctx.fetch_url(&url).await {
            Ok(o) if o.is_success() => {
                let size = o
                    .content_length
                    .map(|bytes| format!("{}KB", kilobytes(bytes)))
                    .unwrap_or_default();
                TestResult::pass(name).with_details(size)
            }
            Ok(o) => TestResult::fail(name).with_details(format!("Status: {}", o.status)),
            Err(e) if e.is_network() => TestResult::fail(name).with_details(e.to_string()),
            Err(e) => return Err(e),
        };
        ctx.assert(result);
    }
    Ok(())
}
