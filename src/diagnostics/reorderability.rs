//! Reorderability diagnostic
//!
//! Lower is better. An adjacent pair is *ordered* when something forces the
//! first scene to come before the second:
//!
//! - the connector between them is BUT or THEREFORE
//! - the beats constrain order: PLANT then PAYOFF, or two arc anchors
//!   (SETUP, INCITE, CRISIS, CLIMAX, RESOLVE) in rising position
//! - tension climbs by at least [`TENSION_STEP`]
//!
//! Every other pair could be swapped without changing the story's logic.

use super::{percent, Diagnostic, DiagnosticThresholds, DiagnosticType};
use crate::context::{BeatFunction, DiagnosticContext, Scene};
use crate::models::{DiagnosticIssue, Severity};

/// Tension rise that on its own pins two scenes in order
pub const TENSION_STEP: i16 = 3;

pub struct ReorderabilityDiagnostic {
    thresholds: DiagnosticThresholds,
}

impl ReorderabilityDiagnostic {
    pub fn new(thresholds: DiagnosticThresholds) -> Self {
        Self { thresholds }
    }

    /// Fraction of adjacent pairs that could be swapped; 0.0 with no pairs
    pub fn score(&self, ctx: &DiagnosticContext) -> f64 {
        let pairs = ctx.scenes().len().saturating_sub(1);
        if pairs == 0 {
            return 0.0;
        }
        reorderable_pairs(ctx.scenes()).count() as f64 / pairs as f64
    }
}

impl Default for ReorderabilityDiagnostic {
    fn default() -> Self {
        Self::new(DiagnosticThresholds::default())
    }
}

fn reorderable_pairs(scenes: &[Scene]) -> impl Iterator<Item = (&Scene, &Scene)> {
    scenes
        .windows(2)
        .map(|pair| (&pair[0], &pair[1]))
        .filter(|(a, b)| !is_ordered(a, b))
}

fn is_ordered(first: &Scene, second: &Scene) -> bool {
    if first.connector.is_some_and(|c| c.is_causal()) {
        return true;
    }
    if let (Some(a), Some(b)) = (first.beat(), second.beat()) {
        if beats_constrain_order(a, b) {
            return true;
        }
    }
    matches!(
        (first.tension, second.tension),
        (Some(a), Some(b)) if i16::from(b) - i16::from(a) >= TENSION_STEP
    )
}

fn beats_constrain_order(first: &BeatFunction, second: &BeatFunction) -> bool {
    if *first == BeatFunction::Plant && *second == BeatFunction::Payoff {
        return true;
    }
    matches!(
        (first.anchor_rank(), second.anchor_rank()),
        (Some(a), Some(b)) if b > a
    )
}

impl Diagnostic for ReorderabilityDiagnostic {
    fn diagnostic_type(&self) -> DiagnosticType {
        DiagnosticType::Reorderability
    }

    fn description(&self) -> &'static str {
        "Finds adjacent scenes that could be swapped without consequence"
    }

    fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64> {
        Some(self.score(ctx))
    }

    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
        let mut issues: Vec<DiagnosticIssue> = reorderable_pairs(ctx.scenes())
            .map(|(a, b)| {
                self.issue(
                    Severity::Suggestion,
                    format!(
                        "Scenes {} and {} could be swapped without changing the story",
                        a.number, b.number
                    ),
                )
                .with_recommendation(format!(
                    "Make scene {} depend on scene {}: a consequence, a complication, or a payoff",
                    b.number, a.number
                ))
            })
            .collect();

        let pairs = ctx.scenes().len().saturating_sub(1);
        let score = self.score(ctx);
        let severity = self.thresholds.severity_for_reorderability(score);
        let mut summary = self.issue(
            severity,
            format!(
                "Reorderability: {} ({}/{} adjacent pairs could be swapped)",
                percent(score),
                issues.len(),
                pairs
            ),
        );
        if severity != Severity::Info {
            summary = summary.with_recommendation(
                "Add causal connections so scenes cannot be shuffled",
            );
        }
        issues.push(summary);

        if !ctx.beat_map_available() {
            issues.push(
                self.issue(
                    Severity::Info,
                    "No beat functions annotated; reorderability judged from connectors and tension only",
                )
                .with_recommendation("Provide a beat map JSON for a more precise analysis"),
            );
        }

        issues
    }
}
