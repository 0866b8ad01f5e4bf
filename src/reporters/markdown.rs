//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for script notes, pull request comments on a screenplay repo,
//! or a writers' room wiki.

use crate::models::{DiagnosticIssue, DiagnosticReport, HealthLabel, Severity};
use anyhow::Result;
use chrono::Local;

/// Maximum issues to show per severity level
const MAX_ISSUES_PER_SEVERITY: usize = 10;

pub fn render(report: &DiagnosticReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');
    md.push_str(&render_metrics(report));
    md.push('\n');
    md.push_str(&render_priority_fixes(report));
    md.push_str(&render_issues(report));
    md.push('\n');
    md.push_str(&render_footer());

    Ok(md)
}

fn health_badge(health: Option<HealthLabel>) -> &'static str {
    match health {
        Some(HealthLabel::Excellent) => "🟢",
        Some(HealthLabel::Good) => "🟢",
        Some(HealthLabel::Fair) => "🟡",
        Some(HealthLabel::Poor) => "🟠",
        Some(HealthLabel::Critical) => "🔴",
        None => "⚪",
    }
}

fn render_header(report: &DiagnosticReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"# Narrative Diagnostics: {}

**Overall health: {} {}** | **{} critical** | **{} warnings**

Generated: {}
"#,
        report.title,
        health_badge(report.metrics.overall_health),
        report.overall_health(),
        report.critical_count,
        report.warning_count,
        timestamp
    )
}

fn metric_line(name: &str, score: Option<f64>, health: Option<HealthLabel>, direction: &str) -> String {
    let value = score.map_or_else(|| "n/a".to_string(), |s| format!("{:.0}%", s * 100.0));
    format!(
        "| {} | {} | {} {} | {} |\n",
        name,
        value,
        health_badge(health),
        health.map_or("Unknown", |h| h.as_str()),
        direction
    )
}

fn render_metrics(report: &DiagnosticReport) -> String {
    let m = &report.metrics;
    let mut md = String::from(
        "## Metrics\n\n| Metric | Score | Health | Direction |\n|--------|-------|--------|-----------|\n",
    );
    md.push_str(&metric_line(
        "Causal binding",
        Some(m.causal_binding_ratio),
        m.causal_binding_health,
        "higher is better",
    ));
    md.push_str(&metric_line(
        "Reorderability",
        Some(m.reorderability_score),
        m.reorderability_health,
        "lower is better",
    ));
    md.push_str(&metric_line(
        "Necessity",
        Some(m.necessity_score),
        m.necessity_health,
        "higher is better",
    ));
    md.push_str(&metric_line(
        "Information economy",
        m.information_economy_score,
        m.information_economy_health,
        "higher is better",
    ));
    md
}

fn render_priority_fixes(report: &DiagnosticReport) -> String {
    if report.priority_fixes.is_empty() {
        return String::new();
    }
    let mut md = String::from("## Priority Fixes\n\n");
    for (i, fix) in report.priority_fixes.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, fix));
    }
    md.push('\n');
    md
}

fn render_issue(issue: &DiagnosticIssue) -> String {
    let mut line = format!("- **{}** `{}`", issue.description, issue.category);
    if let Some(rec) = &issue.recommendation {
        line.push_str(&format!("\n  - Fix: {rec}"));
    }
    line.push('\n');
    line
}

fn render_issues(report: &DiagnosticReport) -> String {
    let mut md = format!("## Issues ({})\n\n", report.issues_summary.total);
    if report.issues.is_empty() {
        md.push_str("No issues found.\n");
        return md;
    }

    for severity in [
        Severity::Critical,
        Severity::Warning,
        Severity::Suggestion,
        Severity::Info,
    ] {
        let matching: Vec<&DiagnosticIssue> = report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect();
        if matching.is_empty() {
            continue;
        }
        md.push_str(&format!("### {} ({})\n\n", severity, matching.len()));
        for issue in matching.iter().take(MAX_ISSUES_PER_SEVERITY) {
            md.push_str(&render_issue(issue));
        }
        if matching.len() > MAX_ISSUES_PER_SEVERITY {
            md.push_str(&format!(
                "\n*...and {} more*\n",
                matching.len() - MAX_ISSUES_PER_SEVERITY
            ));
        }
        md.push('\n');
    }
    md
}

fn render_footer() -> String {
    format!(
        "---\n\n*Generated by narratological v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}
