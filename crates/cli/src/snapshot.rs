//! `site-snapshot`: capture a browser view of the first reachable URL
//!
//! Tries each candidate URL in order through Playwright, prints what the
//! browser saw, and saves a full-page screenshot of the first one answering
//! 200. Exits 1 when none did.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use sitecheck::browser::{BrowserConfig, BrowserHandle, BrowserKind, GotoOptions, Navigation, WaitUntil};
use sitecheck::HarnessConfig;
use sitecheck_cli::output::{presence, print_error, print_field, print_info, print_success, print_warning};

/// Short HTML documents are echoed in full; they are usually error pages
const SHORT_PAGE_THRESHOLD: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "site-snapshot")]
#[command(about = "Screenshot the first candidate URL that answers 200")]
#[command(version)]
struct Args {
    /// Candidate URLs, tried in order (defaults to the configured live URL)
    urls: Vec<String>,

    /// Screenshot destination
    #[arg(short, long, default_value = "live-screenshot.png")]
    output: PathBuf,

    /// Navigation timeout per URL
    #[arg(long, default_value = "15000")]
    timeout_ms: u64,

    /// load, domcontentloaded, networkidle or commit
    #[arg(long, default_value = "load")]
    wait_until: WaitUntil,

    /// CSS selector to report as present/absent (repeatable)
    #[arg(long = "selector")]
    selectors: Vec<String>,

    /// Extra wait after navigation before probing
    #[arg(long, default_value = "0")]
    settle_ms: u64,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// chromium, firefox or webkit
    #[arg(long, default_value = "chromium")]
    browser: BrowserKind,
}

impl Args {
    fn goto_options(&self) -> GotoOptions {
        GotoOptions {
            timeout_ms: self.timeout_ms,
            wait_until: self.wait_until,
            probe_selectors: self.selectors.clone(),
            settle_ms: self.settle_ms,
        }
    }

    fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            browser: self.browser,
            headless: !self.headed,
            ..Default::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    sitecheck_cli::init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            print_warning("No candidate URL answered 200");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("snapshot failed: {e:#}");
            print_error(&format!("Error: {e:#}"));
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let urls = if args.urls.is_empty() {
        vec![HarnessConfig::from_env()?.live_url]
    } else {
        args.urls.clone()
    };
    let options = args.goto_options();
    let mut browser = BrowserHandle::launch(args.browser_config())?;

    let mut captured = false;
    for url in &urls {
        println!("\nTrying: {url}");
        let nav = match browser.goto(url, &options).await {
            Ok(nav) => nav,
            Err(e) => {
                print_error(&format!("Error: {e}"));
                continue;
            }
        };
        describe(&nav);

        if nav.status == Some(200) {
            browser.screenshot(&args.output, true).await?;
            print_success(&format!("Screenshot saved to {}", args.output.display()));
            captured = true;
            break;
        }
        debug!(url = %url, status = ?nav.status, "not capturing");
    }

    browser.close();
    Ok(captured)
}

fn describe(nav: &Navigation) {
    match nav.status {
        Some(status) => print_field("Status", status),
        None => print_field("Status", "no response"),
    }
    print_field("URL", &nav.final_url);
    print_field("Title", &nav.title);
    print_field("HTML length", nav.html_length);
    if nav.html_length < SHORT_PAGE_THRESHOLD {
        print_info("Page is suspiciously short");
    }
    for probe in &nav.selectors {
        print_field(&probe.selector, presence(probe.present));
    }
    for line in &nav.console {
        print_field("Console", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults_match_the_quick_check() {
        let args = Args::try_parse_from(["site-snapshot"]).unwrap();
        assert!(args.urls.is_empty());
        assert_eq!(args.output, PathBuf::from("live-screenshot.png"));

        let options = args.goto_options();
        assert_eq!(options.timeout_ms, 15_000);
        assert_eq!(options.wait_until, WaitUntil::Load);
        assert!(args.browser_config().headless);
    }

    #[test]
    fn urls_and_selectors_keep_order() {
        let args = Args::try_parse_from([
            "site-snapshot",
            "https://a.example",
            "https://b.example",
            "--selector",
            "section",
            "--selector",
            "#quote-form",
            "--headed",
        ])
        .unwrap();
        assert_eq!(args.urls, vec!["https://a.example", "https://b.example"]);
        assert_eq!(args.goto_options().probe_selectors, vec!["section", "#quote-form"]);
        assert!(!args.browser_config().headless);
    }

    #[test_case("networkidle", WaitUntil::NetworkIdle)]
    #[test_case("domcontentloaded", WaitUntil::DomContentLoaded)]
    #[test_case("commit", WaitUntil::Commit)]
    fn wait_strategy_parses(value: &str, expected: WaitUntil) {
        let args = Args::try_parse_from(["site-snapshot", "--wait-until", value]).unwrap();
        assert_eq!(args.wait_until, expected);
    }

    #[test]
    fn unknown_browser_is_rejected() {
        assert!(Args::try_parse_from(["site-snapshot", "--browser", "netscape"]).is_err());
    }
}
