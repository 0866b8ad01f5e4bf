//! Core data models for narratological diagnostics
//!
//! These models are shared by every diagnostic: the severity scale, the
//! issue record each diagnostic emits, and the aggregate metrics/report the
//! runner produces.

use crate::diagnostics::DiagnosticThresholds;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a deterministic issue ID based on content hash.
///
/// Issues produced from the same context carry the same ID across runs,
/// which keeps reports diffable and lets callers deduplicate.
///
/// The ID is a 16-character hex string derived from hashing:
/// - category (which diagnostic produced it)
/// - description (what the issue is)
pub fn deterministic_issue_id(category: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_bytes());
    hasher.update(b"\n");
    hasher.update(description.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Severity levels for issues, ordered by escalation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Suggestion,
    Warning,
    Critical,
}

impl Severity {
    /// Canonicalize a free-text severity (e.g. from an LLM answer).
    ///
    /// Matching is case-insensitive; anything unrecognized maps to `Warning`.
    pub fn from_llm_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "suggestion" => Severity::Suggestion,
            "info" => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Suggestion => write!(f, "SUGGESTION"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A structural problem (or note) reported by a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    #[serde(default)]
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub category: String,
}

impl DiagnosticIssue {
    pub fn new(
        category: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let description = description.into();
        Self {
            id: deterministic_issue_id(&category, &description),
            description,
            severity,
            recommendation: None,
            category,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Summary of issues by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesSummary {
    pub critical: usize,
    pub warning: usize,
    pub suggestion: usize,
    pub info: usize,
    pub total: usize,
}

impl IssuesSummary {
    pub fn from_issues(issues: &[DiagnosticIssue]) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Suggestion => summary.suggestion += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Health classification of a metric, best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthLabel {
    /// Rank where a larger value is more severe
    fn severity_rank(self) -> u8 {
        match self {
            HealthLabel::Excellent => 0,
            HealthLabel::Good => 1,
            HealthLabel::Fair => 2,
            HealthLabel::Poor => 3,
            HealthLabel::Critical => 4,
        }
    }

    /// The most severe label in `labels`, or `None` when empty
    pub fn worst(labels: impl IntoIterator<Item = HealthLabel>) -> Option<HealthLabel> {
        labels.into_iter().max_by_key(|l| l.severity_rank())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLabel::Excellent => "Excellent",
            HealthLabel::Good => "Good",
            HealthLabel::Fair => "Fair",
            HealthLabel::Poor => "Poor",
            HealthLabel::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate of per-diagnostic scores plus their health classification
///
/// All scores are in [0, 1]. `reorderability_score` is lower-is-better; the
/// rest are higher-is-better. `information_economy_score` is `None` when it
/// could not be measured (no LLM provider, or the provider failed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMetrics {
    pub causal_binding_ratio: f64,
    pub reorderability_score: f64,
    pub necessity_score: f64,
    pub information_economy_score: Option<f64>,
    #[serde(default)]
    pub causal_binding_health: Option<HealthLabel>,
    #[serde(default)]
    pub reorderability_health: Option<HealthLabel>,
    #[serde(default)]
    pub necessity_health: Option<HealthLabel>,
    #[serde(default)]
    pub information_economy_health: Option<HealthLabel>,
    #[serde(default)]
    pub overall_health: Option<HealthLabel>,
}

impl DiagnosticMetrics {
    pub fn new(
        causal_binding_ratio: f64,
        reorderability_score: f64,
        necessity_score: f64,
        information_economy_score: Option<f64>,
    ) -> Self {
        Self {
            causal_binding_ratio,
            reorderability_score,
            necessity_score,
            information_economy_score,
            ..Default::default()
        }
    }

    /// Classify every metric and derive the overall health.
    ///
    /// The overall label is the worst of the known per-metric labels; an
    /// unmeasured information-economy score does not take part.
    pub fn compute_health(&mut self, thresholds: &DiagnosticThresholds) {
        self.causal_binding_health = Some(thresholds.causal_binding_health(self.causal_binding_ratio));
        self.reorderability_health = Some(thresholds.reorderability_health(self.reorderability_score));
        self.necessity_health = Some(thresholds.necessity_health(self.necessity_score));
        self.information_economy_health = self
            .information_economy_score
            .map(|s| thresholds.information_economy_health(s));

        self.overall_health = HealthLabel::worst(
            [
                self.causal_binding_health,
                self.reorderability_health,
                self.necessity_health,
                self.information_economy_health,
            ]
            .into_iter()
            .flatten(),
        );
    }
}

/// Full result of a diagnostic battery for one script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub title: String,
    #[serde(flatten)]
    pub metrics: DiagnosticMetrics,
    pub critical_count: usize,
    pub warning_count: usize,
    /// Issues contributed by framework (study) diagnostics
    #[serde(default)]
    pub framework_issues: usize,
    pub priority_fixes: Vec<String>,
    pub issues: Vec<DiagnosticIssue>,
    pub issues_summary: IssuesSummary,
}

impl DiagnosticReport {
    /// Overall health label, `"Unknown"` if health was never computed
    pub fn overall_health(&self) -> &'static str {
        self.metrics
            .overall_health
            .map(|h| h.as_str())
            .unwrap_or("Unknown")
    }
}
