//! `run-tests`: smoke-test the marketing site
//!
//! Targets the local dev server by default, or the deployed site with
//! `--live`. Exits 0 only when every check passed.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use sitecheck::{ConsoleReporter, Harness, HarnessConfig, HarnessOptions, HttpFetcher, Target};

#[derive(Parser, Debug)]
#[command(name = "run-tests")]
#[command(about = "Run the site smoke-test suite")]
struct Args {
    /// Test the deployed site instead of the local dev server
    #[arg(long)]
    live: bool,
}

impl Args {
    fn target(&self) -> Target {
        if self.live {
            Target::Live
        } else {
            Target::Local
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    sitecheck_cli::init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("run failed: {e:#}");
            eprintln!("Test suite error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<u8> {
    let config = HarnessConfig::from_env()?;
    let target = args.target();
    let suite = sitecheck_cli::load_suite(&config)?;
    info!(suite = %suite.name, groups = suite.groups.len(), ?target, "suite loaded");

    let fetcher = HttpFetcher::with_user_agent(
        config.base_url(target),
        config.timeout(),
        config.user_agent.as_deref(),
    )?;
    let options = HarnessOptions::from_config(&config, suite.name.clone());
    let reporter = ConsoleReporter::stdout(std::io::stdout().is_terminal());

    let groups = suite.into_groups();
    let mut harness = Harness::new(fetcher, reporter, options);
    let outcome = harness.run(&groups).await?;
    Ok(outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&["run-tests"], Target::Local ; "local by default")]
    #[test_case(&["run-tests", "--live"], Target::Live ; "live flag")]
    fn flag_selects_target(argv: &[&str], expected: Target) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.target(), expected);
    }

    #[test]
    fn targets_map_to_configured_urls() {
        let config = HarnessConfig::default();
        let local = Args::try_parse_from(["run-tests"]).unwrap();
        let live = Args::try_parse_from(["run-tests", "--live"]).unwrap();
        assert_eq!(config.base_url(local.target()), "http://localhost:4321");
        assert_eq!(
            config.base_url(live.target()),
            "https://bealer-insurance-site.pages.dev"
        );
    }

    #[test_case("--version")]
    #[test_case("-V")]
    #[test_case("--verbose")]
    fn other_flags_are_rejected(flag: &str) {
        assert!(Args::try_parse_from(["run-tests", flag]).is_err());
    }
}
