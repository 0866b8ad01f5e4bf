//! JSON reporter
//!
//! Outputs the full DiagnosticReport as pretty-printed JSON. Metrics are
//! flattened to the top level so `jq .causal_binding_ratio` works.

use crate::models::DiagnosticReport;
use anyhow::Result;

pub fn render(report: &DiagnosticReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
