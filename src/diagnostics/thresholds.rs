//! Cut-points for health classification
//!
//! Each higher-is-better metric has four descending cut-points
//! (excellent, good, warning, critical) that split it into five labels.
//! Reorderability is lower-is-better and uses two ceilings.
//!
//! Monotonicity of the cut-points is not validated; they are always read
//! in descending order.

use crate::models::{HealthLabel, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticThresholds {
    pub causal_binding_excellent: f64,
    pub causal_binding_good: f64,
    pub causal_binding_warning: f64,
    pub causal_binding_critical: f64,

    pub reorderability_excellent: f64,
    pub reorderability_good: f64,

    pub necessity_excellent: f64,
    pub necessity_good: f64,
    pub necessity_warning: f64,
    pub necessity_critical: f64,

    pub information_economy_excellent: f64,
    pub information_economy_good: f64,
    pub information_economy_warning: f64,
    pub information_economy_critical: f64,

    /// Framework alignment below this adds a WARNING
    pub framework_alignment_min: f64,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            causal_binding_excellent: 0.90,
            causal_binding_good: 0.80,
            causal_binding_warning: 0.60,
            causal_binding_critical: 0.40,

            reorderability_excellent: 0.15,
            reorderability_good: 0.30,

            necessity_excellent: 0.85,
            necessity_good: 0.70,
            necessity_warning: 0.60,
            necessity_critical: 0.50,

            information_economy_excellent: 0.85,
            information_economy_good: 0.70,
            information_economy_warning: 0.50,
            information_economy_critical: 0.30,

            framework_alignment_min: 0.70,
        }
    }
}

fn classify_descending(score: f64, cuts: [f64; 4]) -> HealthLabel {
    let [excellent, good, warning, critical] = cuts;
    if score >= excellent {
        HealthLabel::Excellent
    } else if score >= good {
        HealthLabel::Good
    } else if score >= warning {
        HealthLabel::Fair
    } else if score >= critical {
        HealthLabel::Poor
    } else {
        HealthLabel::Critical
    }
}

fn severity_descending(score: f64, excellent: f64, good: f64, warning: f64) -> Severity {
    if score >= excellent {
        Severity::Info
    } else if score >= good {
        Severity::Suggestion
    } else if score >= warning {
        Severity::Warning
    } else {
        Severity::Critical
    }
}

impl DiagnosticThresholds {
    pub fn causal_binding_health(&self, score: f64) -> HealthLabel {
        classify_descending(
            score,
            [
                self.causal_binding_excellent,
                self.causal_binding_good,
                self.causal_binding_warning,
                self.causal_binding_critical,
            ],
        )
    }

    pub fn necessity_health(&self, score: f64) -> HealthLabel {
        classify_descending(
            score,
            [
                self.necessity_excellent,
                self.necessity_good,
                self.necessity_warning,
                self.necessity_critical,
            ],
        )
    }

    pub fn information_economy_health(&self, score: f64) -> HealthLabel {
        classify_descending(
            score,
            [
                self.information_economy_excellent,
                self.information_economy_good,
                self.information_economy_warning,
                self.information_economy_critical,
            ],
        )
    }

    /// Lower is better: past the good ceiling is already Critical
    pub fn reorderability_health(&self, score: f64) -> HealthLabel {
        if score <= self.reorderability_excellent {
            HealthLabel::Excellent
        } else if score <= self.reorderability_good {
            HealthLabel::Good
        } else {
            HealthLabel::Critical
        }
    }

    /// Severity of the causal-binding summary issue
    pub fn severity_for_causal_binding(&self, score: f64) -> Severity {
        severity_descending(
            score,
            self.causal_binding_excellent,
            self.causal_binding_good,
            self.causal_binding_warning,
        )
    }

    pub fn severity_for_necessity(&self, score: f64) -> Severity {
        severity_descending(
            score,
            self.necessity_excellent,
            self.necessity_good,
            self.necessity_warning,
        )
    }

    pub fn severity_for_information_economy(&self, score: f64) -> Severity {
        severity_descending(
            score,
            self.information_economy_excellent,
            self.information_economy_good,
            self.information_economy_warning,
        )
    }

    pub fn severity_for_reorderability(&self, score: f64) -> Severity {
        match self.reorderability_health(score) {
            HealthLabel::Excellent => Severity::Info,
            HealthLabel::Good => Severity::Suggestion,
            _ => Severity::Warning,
        }
    }
}
