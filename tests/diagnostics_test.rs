//! Library-level diagnostics tests against the fixture inputs
//!
//! Exercises the public API end to end: load an input, build a runner,
//! run the battery and inspect the report.

use narratological::compendium::load_compendium;
use narratological::diagnostics::{create_diagnostic_runner, DiagnosticType, MAX_PRIORITY_FIXES};
use narratological::llm::{LlmProvider, MockProvider, MockResponse};
use narratological::models::{HealthLabel, Severity};
use narratological::parsers::load_input;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_causal_beat_map_scores_full_binding() {
    let (script, ctx) = load_input(&fixture("three_act.json"), None).unwrap();
    assert!(script.is_none());
    assert_eq!(ctx.scenes().len(), 5);

    let report = create_diagnostic_runner(None, None, None).run_all(&ctx, true);
    assert_eq!(report.title, "The Map");
    assert_eq!(report.metrics.causal_binding_ratio, 1.0);
    assert!(matches!(
        report.metrics.causal_binding_health,
        Some(HealthLabel::Excellent) | Some(HealthLabel::Good)
    ));
    assert_eq!(report.metrics.information_economy_score, None);
    assert!(report
        .issues
        .iter()
        .any(|i| i.description == "Information economy analysis requires an LLM provider"));
    // No compendium attached, so no framework pass
    assert_eq!(report.framework_issues, 0);
}

#[test]
fn test_episodic_beat_map_is_critical() {
    let (_, ctx) = load_input(&fixture("episodic.json"), None).unwrap();
    let report = create_diagnostic_runner(None, None, None).run_all(&ctx, false);

    assert_eq!(report.metrics.causal_binding_ratio, 0.0);
    assert_eq!(report.metrics.overall_health, Some(HealthLabel::Critical));
    assert!(report.critical_count > 0);

    let weak = report
        .issues
        .iter()
        .filter(|i| i.description.starts_with("Weak AND THEN transition"))
        .count();
    assert_eq!(weak, 2);

    assert!(!report.priority_fixes.is_empty());
    assert!(report.priority_fixes.len() <= MAX_PRIORITY_FIXES);
    assert_eq!(report.critical_count, report.issues_summary.critical);
    assert_eq!(report.issues_summary.total, report.issues.len());
}

#[test]
fn test_title_override_and_script_input() {
    let (script, ctx) = load_input(&fixture("short_script.txt"), None).unwrap();
    let script = script.expect("text input yields a script");
    assert_eq!(script.title, "Short Script");
    assert_eq!(ctx.scenes().len(), 3);
    assert!(ctx.characters().iter().any(|c| c == "ANNA"));

    let (_, ctx) = load_input(&fixture("episodic.json"), Some("Sunday")).unwrap();
    assert_eq!(ctx.title(), "Sunday");
}

#[test]
fn test_run_all_is_deterministic() {
    let (_, ctx) = load_input(&fixture("three_act.json"), None).unwrap();
    let runner = create_diagnostic_runner(None, None, None);
    assert_eq!(runner.run_all(&ctx, false), runner.run_all(&ctx, false));
}

#[test]
fn test_economy_with_mock_provider() {
    let mock = Arc::new(MockProvider::new());
    mock.push(MockResponse::structured(json!({
        "redundant_expositions": ["The map is explained twice"],
        "missing_setups": [],
        "efficiency_score": 0.9,
        "recommendations": ["Cut the second explanation"]
    })));
    let provider: Arc<dyn LlmProvider> = mock.clone();
    let runner = create_diagnostic_runner(Some(provider), None, None);

    let (_, ctx) = load_input(&fixture("three_act.json"), None).unwrap();
    let (score, issues) = runner.run_information_economy(&ctx);

    assert_eq!(score, Some(0.9));
    assert!(issues
        .iter()
        .any(|i| i.severity == Severity::Warning
            && i.description == "Redundant exposition: The map is explained twice"));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_framework_with_fixture_compendium() {
    let compendium = Arc::new(load_compendium(&fixture("compendium.json")).unwrap());
    assert_eq!(compendium.available_frameworks(), vec!["pixar"]);

    let (_, ctx) = load_input(&fixture("three_act.json"), None).unwrap();
    let runner = create_diagnostic_runner(None, Some(compendium), None);

    let issues = runner.run_framework(&ctx, &["pixar".to_string(), "kubrick".to_string()]);
    assert!(issues
        .iter()
        .any(|i| i.description == "Study 'pixar' has 2 diagnostic questions (LLM required to evaluate)"));
    assert!(issues
        .iter()
        .any(|i| i.description == "Study 'kubrick' not found in compendium"));
}

#[test]
fn test_run_single_by_name() {
    let (_, ctx) = load_input(&fixture("episodic.json"), None).unwrap();
    let runner = create_diagnostic_runner(None, None, None);

    let (score, _) = runner.run_single("causal", &ctx).unwrap();
    assert_eq!(score, Some(0.0));
    let (score, _) = runner.run_single(DiagnosticType::Necessity, &ctx).unwrap();
    assert!(score.is_some());
    assert!(runner.run_single("pacing", &ctx).is_err());
}
