//! The embedded check catalogue parses and covers every site area

use sitecheck::suite::CheckStep;
use sitecheck::{HarnessConfig, SuiteSpec};
use sitecheck_cli::{load_suite, DEFAULT_SUITE};

#[test]
fn embedded_suite_is_valid() {
    let suite = SuiteSpec::from_yaml(DEFAULT_SUITE).unwrap();
    assert_eq!(suite.name, "E2E Test Suite for Goleta Insurance Site");

    let groups: Vec<_> = suite.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(
        groups,
        vec![
            "Homepage tests",
            "Navigation tests",
            "Renters insurance page tests",
            "SEO tests",
            "Compliance tests (PRD requirements)",
            "Image tests",
            "Spanish page tests",
            "Performance tests",
            "Form structure tests",
        ]
    );
}

#[test]
fn content_groups_start_with_a_load() {
    let suite = SuiteSpec::from_yaml(DEFAULT_SUITE).unwrap();
    for group in suite.groups.iter().filter(|g| g.name != "Navigation tests") {
        assert!(
            matches!(group.steps[0], CheckStep::Load { .. }),
            "{} does not load a page first",
            group.name
        );
    }
}

#[test]
fn navigation_probes_every_page() {
    let suite = SuiteSpec::from_yaml(DEFAULT_SUITE).unwrap();
    let nav = &suite.groups[1];
    let probes = nav
        .steps
        .iter()
        .filter(|s| matches!(s, CheckStep::Probe { .. }))
        .count();
    assert_eq!(probes, 9);
    assert!(matches!(
        nav.steps.last(),
        Some(CheckStep::ExpectStatus { status: 404, .. })
    ));
}

#[test]
fn configured_suite_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mini.yaml");
    std::fs::write(
        &path,
        "name: Mini\ngroups:\n  - name: Only\n    steps:\n      - check: probe\n        path: /\n        name: Home accessible\n",
    )
    .unwrap();

    let config = HarnessConfig {
        suite_path: Some(path),
        ..Default::default()
    };
    assert_eq!(load_suite(&config).unwrap().name, "Mini");

    let default = load_suite(&HarnessConfig::default()).unwrap();
    assert_eq!(default.groups.len(), 9);
}
