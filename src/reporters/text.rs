//! Text (terminal) reporter with colors and formatting

use crate::models::{DiagnosticReport, HealthLabel, Severity};
use anyhow::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Issues listed before the "...and N more" line
const MAX_LISTED_ISSUES: usize = 15;

fn health_color(health: Option<HealthLabel>) -> &'static str {
    match health {
        Some(HealthLabel::Excellent) => "\x1b[32m", // Green
        Some(HealthLabel::Good) => "\x1b[92m",      // Light green
        Some(HealthLabel::Fair) => "\x1b[33m",      // Yellow
        Some(HealthLabel::Poor) => "\x1b[91m",      // Light red
        Some(HealthLabel::Critical) => "\x1b[31m",  // Red
        None => "\x1b[90m",
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[31m",
        Severity::Warning => "\x1b[33m",
        Severity::Suggestion => "\x1b[34m",
        Severity::Info => "\x1b[90m",
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::Warning => "[W]",
        Severity::Suggestion => "[S]",
        Severity::Info => "[I]",
    }
}

fn metric_row(name: &str, score: Option<f64>, health: Option<HealthLabel>, note: &str) -> String {
    let value = score.map_or_else(|| "n/a".to_string(), |s| format!("{:.0}%", s * 100.0));
    let label = health.map_or("Unknown", |h| h.as_str());
    format!(
        "  {:<22} {:>5}  {}{:<9}{RESET} {DIM}{}{RESET}\n",
        name,
        value,
        health_color(health),
        label,
        note
    )
}

/// Render report as formatted terminal output
pub fn render(report: &DiagnosticReport) -> Result<String> {
    let mut out = String::new();
    let m = &report.metrics;

    out.push_str(&format!("\n{BOLD}Narrative Diagnostics: {}{RESET}\n", report.title));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Overall health: {}{BOLD}{}{RESET}\n\n",
        health_color(m.overall_health),
        report.overall_health()
    ));

    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    out.push_str(&metric_row(
        "Causal binding",
        Some(m.causal_binding_ratio),
        m.causal_binding_health,
        "higher is better",
    ));
    out.push_str(&metric_row(
        "Reorderability",
        Some(m.reorderability_score),
        m.reorderability_health,
        "lower is better",
    ));
    out.push_str(&metric_row(
        "Necessity",
        Some(m.necessity_score),
        m.necessity_health,
        "higher is better",
    ));
    out.push_str(&metric_row(
        "Information economy",
        m.information_economy_score,
        m.information_economy_health,
        if m.information_economy_score.is_some() {
            "higher is better"
        } else {
            "needs an LLM provider"
        },
    ));
    out.push('\n');

    let s = &report.issues_summary;
    out.push_str(&format!("{BOLD}ISSUES{RESET} ({} total)\n", s.total));
    let mut parts = Vec::new();
    if s.critical > 0 {
        parts.push(format!("\x1b[31m{} critical{RESET}", s.critical));
    }
    if s.warning > 0 {
        parts.push(format!("\x1b[33m{} warning{RESET}", s.warning));
    }
    if s.suggestion > 0 {
        parts.push(format!("\x1b[34m{} suggestion{RESET}", s.suggestion));
    }
    if s.info > 0 {
        parts.push(format!("\x1b[90m{} info{RESET}", s.info));
    }
    if !parts.is_empty() {
        out.push_str(&format!("  {}\n", parts.join(" | ")));
    }
    if report.framework_issues > 0 {
        out.push_str(&format!(
            "  {DIM}{} from framework studies{RESET}\n",
            report.framework_issues
        ));
    }
    out.push('\n');

    let mut ordered: Vec<_> = report.issues.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
    for issue in ordered.iter().take(MAX_LISTED_ISSUES) {
        out.push_str(&format!(
            "  {}{}{RESET} {}\n",
            severity_color(issue.severity),
            severity_tag(issue.severity),
            issue.description
        ));
    }
    let remaining = ordered.len().saturating_sub(MAX_LISTED_ISSUES);
    if remaining > 0 {
        out.push_str(&format!(
            "\n  {DIM}...and {} more (use --format json for the full list){RESET}\n",
            remaining
        ));
    }

    if !report.priority_fixes.is_empty() {
        out.push_str(&format!("\n{BOLD}PRIORITY FIXES{RESET}\n"));
        for (i, fix) in report.priority_fixes.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, fix));
        }
    }
    out.push('\n');

    Ok(out)
}
