//! Playwright browser automation
//!
//! Each call generates a small Node script, runs it, and reads back one
//! marked JSON line from stdout. No browser survives between calls, so
//! [`BrowserHandle::screenshot`] re-navigates to the last visited URL.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{SiteCheckError, SiteCheckResult};

const RESULT_MARKER: &str = "SITECHECK_RESULT:";

/// Time allowed for browser launch and teardown on top of the navigation timeout
const LAUNCH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = SiteCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(SiteCheckError::InvalidConfig(format!("unknown browser: {other}"))),
        }
    }
}

/// When Playwright considers a navigation finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitUntil {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
            WaitUntil::Commit => "commit",
        }
    }
}

impl FromStr for WaitUntil {
    type Err = SiteCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(WaitUntil::Load),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "networkidle" => Ok(WaitUntil::NetworkIdle),
            "commit" => Ok(WaitUntil::Commit),
            other => Err(SiteCheckError::InvalidConfig(format!("unknown wait strategy: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GotoOptions {
    pub timeout_ms: u64,
    pub wait_until: WaitUntil,
    /// Selectors reported as present/absent after navigation
    pub probe_selectors: Vec<String>,
    /// Extra wait after navigation settles
    pub settle_ms: u64,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            wait_until: WaitUntil::Load,
            probe_selectors: Vec::new(),
            settle_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorProbe {
    pub selector: String,
    pub present: bool,
}

/// What a navigation observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    /// Main document status; None for navigations without a response
    pub status: Option<u16>,
    pub title: String,
    pub final_url: String,
    pub html_length: usize,
    #[serde(default)]
    pub selectors: Vec<SelectorProbe>,
    /// Page console messages and uncaught page errors
    #[serde(default)]
    pub console: Vec<String>,
}

struct Shot<'a> {
    path: &'a Path,
    full_page: bool,
}

/// Playwright browser handle
pub struct BrowserHandle {
    config: BrowserConfig,
    last: Option<(String, GotoOptions)>,
}

impl BrowserHandle {
    /// Verify Playwright is available and create a handle
    pub fn launch(config: BrowserConfig) -> SiteCheckResult<Self> {
        Self::check_playwright_installed()?;
        info!(browser = config.browser.as_str(), headless = config.headless, "browser ready");
        Ok(Self { config, last: None })
    }

    fn check_playwright_installed() -> SiteCheckResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(SiteCheckError::PlaywrightNotFound),
        }
    }

    /// Navigate to `url` and report what the page looked like
    pub async fn goto(&mut self, url: &str, options: &GotoOptions) -> SiteCheckResult<Navigation> {
        let script = self.build_script(url, options, None)?;
        let stdout = self.run_script(&script, options.timeout_ms).await?;
        let navigation = parse_result(&stdout)?;
        self.last = Some((url.to_string(), options.clone()));
        Ok(navigation)
    }

    /// Capture the last visited page to `path`
    pub async fn screenshot(&self, path: &Path, full_page: bool) -> SiteCheckResult<()> {
        let (url, options) = self.last.as_ref().ok_or_else(|| {
            SiteCheckError::Playwright("screenshot requested before any navigation".to_string())
        })?;

        let path = absolute(path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let script = self.build_script(url, options, Some(Shot { path: &path, full_page }))?;
        let stdout = self.run_script(&script, options.timeout_ms).await?;
        parse_result(&stdout)?;
        Ok(())
    }

    pub fn close(self) {
        debug!(browser = self.config.browser.as_str(), "browser handle closed");
    }

    /// Build the Node script for one navigation
    fn build_script(&self, url: &str, options: &GotoOptions, shot: Option<Shot<'_>>) -> SiteCheckResult<String> {
        let screenshot = match shot {
            Some(shot) => format!(
                "await page.screenshot({{ path: {}, fullPage: {} }});",
                serde_json::to_string(&shot.path.to_string_lossy())?,
                shot.full_page
            ),
            None => String::new(),
        };

        let script = SCRIPT_TEMPLATE
            .replace("__BROWSER__", self.config.browser.as_str())
            .replace("__HEADLESS__", &self.config.headless.to_string())
            .replace("__WIDTH__", &self.config.viewport_width.to_string())
            .replace("__HEIGHT__", &self.config.viewport_height.to_string())
            .replace("__URL__", &serde_json::to_string(url)?)
            .replace("__WAIT_UNTIL__", &serde_json::to_string(options.wait_until.as_str())?)
            .replace("__TIMEOUT__", &options.timeout_ms.to_string())
            .replace("__SETTLE__", &options.settle_ms.to_string())
            .replace("__SELECTORS__", &serde_json::to_string(&options.probe_selectors)?)
            .replace("__SCREENSHOT__", &screenshot)
            .replace("__MARKER__", &serde_json::to_string(RESULT_MARKER)?);
        Ok(script)
    }

    /// Run a script with node and return its stdout
    async fn run_script(&self, script: &str, timeout_ms: u64) -> SiteCheckResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("snapshot.js");
        std::fs::write(&script_path, script)?;

        // The script lives in a temp dir, so point module resolution back at
        // the project's node_modules.
        let cwd = std::env::current_dir()?;
        let mut node_path = cwd.join("node_modules").into_os_string();
        if let Some(existing) = std::env::var_os("NODE_PATH") {
            node_path.push(if cfg!(windows) { ";" } else { ":" });
            node_path.push(existing);
        }

        debug!("Running Playwright script: {}", script_path.display());

        let limit = Duration::from_millis(timeout_ms) + LAUNCH_MARGIN;
        let output = tokio::time::timeout(
            limit,
            TokioCommand::new("node")
                .arg(&script_path)
                .current_dir(&cwd)
                .env("NODE_PATH", node_path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SiteCheckError::Playwright(format!("script timed out after {}s", limit.as_secs())))??;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SiteCheckError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }
        Ok(stdout)
    }
}

fn absolute(path: &Path) -> SiteCheckResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Extract the navigation report from script stdout
pub fn parse_result(stdout: &str) -> SiteCheckResult<Navigation> {
    let line = stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix(RESULT_MARKER))
        .ok_or_else(|| SiteCheckError::Playwright("script produced no result".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(line)?;
    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return Err(SiteCheckError::Playwright(error.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

const SCRIPT_TEMPLATE: &str = r#"
const { chromium, firefox, webkit } = require('playwright');

(async () => {
  const browser = await __BROWSER__.launch({ headless: __HEADLESS__ });
  const context = await browser.newContext({
    viewport: { width: __WIDTH__, height: __HEIGHT__ }
  });
  const page = await context.newPage();
  const messages = [];
  page.on('console', msg => messages.push(`${msg.type()}: ${msg.text()}`));
  page.on('pageerror', err => messages.push(`pageerror: ${err.message}`));

  try {
    const response = await page.goto(__URL__, { waitUntil: __WAIT_UNTIL__, timeout: __TIMEOUT__ });
    if (__SETTLE__ > 0) {
      await page.waitForTimeout(__SETTLE__);
    }
    const selectors = [];
    for (const selector of __SELECTORS__) {
      selectors.push({ selector, present: (await page.$(selector)) !== null });
    }
    const html = await page.content();
    __SCREENSHOT__
    console.log(__MARKER__ + JSON.stringify({
      status: response ? response.status() : null,
      title: await page.title(),
      finalUrl: page.url(),
      htmlLength: html.length,
      selectors,
      console: messages,
    }));
  } catch (error) {
    console.log(__MARKER__ + JSON.stringify({ error: error.message }));
  } finally {
    await browser.close();
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> BrowserHandle {
        BrowserHandle {
            config: BrowserConfig::default(),
            last: None,
        }
    }

    #[test]
    fn script_quotes_inputs() {
        let options = GotoOptions {
            wait_until: WaitUntil::NetworkIdle,
            probe_selectors: vec!["section".into(), "#quote-form".into()],
            ..Default::default()
        };
        let script = handle()
            .build_script("https://example.com/it's", &options, None)
            .unwrap();

        assert!(script.contains("await chromium.launch({ headless: true })"));
        assert!(script.contains(r#"page.goto("https://example.com/it's", { waitUntil: "networkidle", timeout: 30000 })"#));
        assert!(script.contains(r##"for (const selector of ["section","#quote-form"])"##));
        assert!(!script.contains("page.screenshot"));
        assert!(!script.contains("__"), "unreplaced placeholder in:\n{script}");
    }

    #[test]
    fn script_with_screenshot() {
        let script = handle()
            .build_script(
                "http://localhost:4322",
                &GotoOptions::default(),
                Some(Shot {
                    path: Path::new("/tmp/shots/live.png"),
                    full_page: true,
                }),
            )
            .unwrap();
        assert!(script.contains(r#"await page.screenshot({ path: "/tmp/shots/live.png", fullPage: true });"#));
    }

    #[test]
    fn parses_navigation() {
        let stdout = format!(
            "noise\n{RESULT_MARKER}{}\n",
            r##"{"status":200,"title":"Goleta Insurance","finalUrl":"https://x.dev/","htmlLength":5120,"selectors":[{"selector":"#quote-form","present":true}],"console":[]}"##
        );
        let nav = parse_result(&stdout).unwrap();
        assert_eq!(nav.status, Some(200));
        assert_eq!(nav.final_url, "https://x.dev/");
        assert_eq!(nav.selectors[0], SelectorProbe { selector: "#quote-form".into(), present: true });
    }

    #[test]
    fn script_errors_surface() {
        let stdout = format!("{RESULT_MARKER}{{\"error\":\"net::ERR_NAME_NOT_RESOLVED\"}}");
        let err = parse_result(&stdout).unwrap_err();
        assert!(matches!(err, SiteCheckError::Playwright(ref m) if m == "net::ERR_NAME_NOT_RESOLVED"));
        assert!(parse_result("nothing here").is_err());
    }

    #[test]
    fn parses_names() {
        assert_eq!("webkit".parse::<BrowserKind>().unwrap(), BrowserKind::Webkit);
        assert_eq!("networkidle".parse::<WaitUntil>().unwrap(), WaitUntil::NetworkIdle);
        assert!("opera".parse::<BrowserKind>().is_err());
    }

    #[tokio::test]
    async fn screenshot_needs_navigation() {
        let err = handle().screenshot(Path::new("x.png"), true).await.unwrap_err();
        assert!(matches!(err, SiteCheckError::Playwright(_)));
    }
}
