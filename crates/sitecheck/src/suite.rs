//! Declarative YAML suite specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use regex::Regex;

use crate::checks::SpecGroup;
use crate::error::{SiteCheckError, SiteCheckResult};
use crate::harness::TestGroup;

/// A complete suite parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    /// Title printed in the run banner
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Groups, run in file order
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,

    /// Glyph shown in the section header
    #[serde(default = "default_icon")]
    pub icon: String,

    pub steps: Vec<CheckStep>,
}

fn default_icon() -> String {
    "•".to_string()
}

/// A single step in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckStep {
    /// Fetch a page and make it the current page. A failed load ends the group.
    Load {
        path: String,
        #[serde(default)]
        label: Option<String>,
        /// Record a pass when the page loads
        #[serde(default = "default_true")]
        announce: bool,
    },

    /// Check that another URL answers without changing the current page
    Probe {
        path: String,
        name: String,
        #[serde(default)]
        body_contains: Option<String>,
    },

    /// Expect an exact status; a mismatch is informational only
    ExpectStatus {
        path: String,
        name: String,
        status: u16,
    },

    ContainsAll {
        name: String,
        needles: Vec<String>,
        /// Always report `found/total`
        #[serde(default)]
        tally: bool,
    },

    ContainsAny {
        name: String,
        needles: Vec<String>,
    },

    Absent {
        name: String,
        needles: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },

    /// Regex match, optionally bounding the first capture's length
    Matches {
        name: String,
        pattern: String,
        #[serde(default)]
        min_len: Option<usize>,
        #[serde(default)]
        max_len: Option<usize>,
        #[serde(default = "default_excerpt")]
        excerpt: usize,
    },

    /// At most `max` matches, ignoring those containing `exclude`
    CountAtMost {
        name: String,
        pattern: String,
        #[serde(default)]
        exclude: Option<String>,
        #[serde(default)]
        max: usize,
    },

    LoadTime {
        name: String,
        under_ms: u64,
    },

    HtmlSize {
        name: String,
        under_kb: u64,
    },

    /// Average of every page loaded so far in this group
    AverageLoad {
        name: String,
        pass_under_ms: u64,
        info_under_ms: u64,
    },

    /// Fetch the first `limit` asset references matched by `pattern`
    Assets {
        pattern: String,
        #[serde(default = "default_asset_limit")]
        limit: usize,
    },
}

fn default_true() -> bool {
    true
}

fn default_excerpt() -> usize {
    40
}

fn default_asset_limit() -> usize {
    3
}

impl CheckStep {
    /// Name the step records under (assets steps record several)
    pub fn name(&self) -> String {
        match self {
            CheckStep::Load { path, label, .. } => {
                format!("{} loads", label.as_deref().unwrap_or(path))
            }
            CheckStep::Probe { name, .. }
            | CheckStep::ExpectStatus { name, .. }
            | CheckStep::ContainsAll { name, .. }
            | CheckStep::ContainsAny { name, .. }
            | CheckStep::Absent { name, .. }
            | CheckStep::Matches { name, .. }
            | CheckStep::CountAtMost { name, .. }
            | CheckStep::LoadTime { name, .. }
            | CheckStep::HtmlSize { name, .. }
            | CheckStep::AverageLoad { name, .. } => name.clone(),
            CheckStep::Assets { .. } => "Asset loads".to_string(),
        }
    }

    fn needles(&self) -> Option<&[String]> {
        match self {
            CheckStep::ContainsAll { needles, .. }
            | CheckStep::ContainsAny { needles, .. }
            | CheckStep::Absent { needles, .. } => Some(needles),
            _ => None,
        }
    }

    fn pattern(&self) -> Option<&str> {
        match self {
            CheckStep::Matches { pattern, .. }
            | CheckStep::CountAtMost { pattern, .. }
            | CheckStep::Assets { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}

impl SuiteSpec {
    /// Parse a suite from a YAML string
    pub fn from_yaml(yaml: &str) -> SiteCheckResult<Self> {
        let suite: Self = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> SiteCheckResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            SiteCheckError::SuiteParse(msg) => {
                SiteCheckError::SuiteParse(format!("{}: {msg}", path.display()))
            }
            SiteCheckError::Yaml(err) => {
                SiteCheckError::SuiteParse(format!("{}: {err}", path.display()))
            }
            other => other,
        })
    }

    /// Load a suite file, or merge every `*.yaml`/`*.yml` under a directory.
    ///
    /// Directory entries are visited in path order so group order is stable.
    pub fn load(path: &Path) -> SiteCheckResult<Self> {
        if path.is_file() {
            return Self::from_file(path);
        }

        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut suites = files.iter().map(|f| Self::from_file(f));
        let mut merged = suites.next().ok_or_else(|| {
            SiteCheckError::SuiteParse(format!("no suite files found in {}", path.display()))
        })??;
        for suite in suites {
            merged.groups.extend(suite?.groups);
        }
        Ok(merged)
    }

    /// Reject empty groups and compile every pattern up front
    pub fn validate(&self) -> SiteCheckResult<()> {
        if self.groups.is_empty() {
            return Err(SiteCheckError::SuiteParse(format!("suite '{}' has no groups", self.name)));
        }
        for group in &self.groups {
            if group.steps.is_empty() {
                return Err(SiteCheckError::SuiteParse(format!(
                    "group '{}' has no steps",
                    group.name
                )));
            }
            for step in &group.steps {
                if step.needles().is_some_and(|n| n.is_empty()) {
                    return Err(SiteCheckError::SuiteParse(format!(
                        "group '{}', step '{}': needles must not be empty",
                        group.name,
                        step.name()
                    )));
                }
                if let Some(pattern) = step.pattern() {
                    Regex::new(pattern).map_err(|e| {
                        SiteCheckError::SuiteParse(format!(
                            "group '{}', step '{}': {e}",
                            group.name,
                            step.name()
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Turn the suite into runnable groups
    pub fn into_groups(self) -> Vec<Box<dyn TestGroup>> {
        self.groups
            .into_iter()
            .map(|g| Box::new(SpecGroup::new(g)) as Box<dyn TestGroup>)
            .collect()
    }
}
