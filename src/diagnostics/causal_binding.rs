//! Causal binding diagnostic
//!
//! Measures how much of the story is bound by BUT/THEREFORE rather than
//! strung together with AND THEN. Episodic scripts score low.

use super::{percent, Diagnostic, DiagnosticThresholds, DiagnosticType};
use crate::context::{Connector, DiagnosticContext};
use crate::models::{DiagnosticIssue, Severity};

const REPLACE_CONNECTOR: &str = "Replace with BUT (complication) or THEREFORE (consequence) \
so the second scene follows from the first";

pub struct CausalBindingDiagnostic {
    thresholds: DiagnosticThresholds,
}

impl CausalBindingDiagnostic {
    pub fn new(thresholds: DiagnosticThresholds) -> Self {
        Self { thresholds }
    }

    /// Fraction of transitions that are causal; 1.0 with no transitions
    pub fn score(&self, ctx: &DiagnosticContext) -> f64 {
        let transitions = ctx.transitions();
        if transitions.is_empty() {
            return 1.0;
        }
        let causal = transitions.iter().filter(|t| t.is_causal).count();
        causal as f64 / transitions.len() as f64
    }
}

impl Default for CausalBindingDiagnostic {
    fn default() -> Self {
        Self::new(DiagnosticThresholds::default())
    }
}

impl Diagnostic for CausalBindingDiagnostic {
    fn diagnostic_type(&self) -> DiagnosticType {
        DiagnosticType::CausalBinding
    }

    fn description(&self) -> &'static str {
        "Measures BUT/THEREFORE versus AND THEN transitions"
    }

    fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64> {
        Some(self.score(ctx))
    }

    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
        let transitions = ctx.transitions();

        let mut issues: Vec<DiagnosticIssue> = transitions
            .iter()
            .filter(|t| t.connector == Some(Connector::AndThen))
            .map(|t| {
                self.issue(
                    Severity::Warning,
                    format!(
                        "Weak AND THEN transition between scene {} and scene {}",
                        t.from_scene, t.to_scene
                    ),
                )
                .with_recommendation(REPLACE_CONNECTOR)
            })
            .collect();

        let score = self.score(ctx);
        let causal = transitions.iter().filter(|t| t.is_causal).count();
        let severity = self.thresholds.severity_for_causal_binding(score);
        let mut summary = self.issue(
            severity,
            format!(
                "Causal binding ratio: {} ({}/{} transitions are BUT/THEREFORE)",
                percent(score),
                causal,
                transitions.len()
            ),
        );
        if severity != Severity::Info {
            summary = summary.with_recommendation(
                "Tighten the scene chain: each scene should happen BECAUSE OF or IN SPITE OF the one before",
            );
        }
        issues.push(summary);

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Scene;
    use crate::diagnostics::fixtures::{causal_context, empty_context, episodic_context, single_scene_context};

    fn chain(connectors: &[Connector]) -> DiagnosticContext {
        let mut scenes: Vec<Scene> = connectors
            .iter()
            .enumerate()
            .map(|(i, c)| Scene::new(i as u32 + 1, "", "").with_connector(*c))
            .collect();
        scenes.push(Scene::new(connectors.len() as u32 + 1, "", ""));
        DiagnosticContext::new("chain", scenes, vec![])
    }

    #[test]
    fn test_fully_causal_scores_one() {
        let d = CausalBindingDiagnostic::default();
        assert_eq!(d.score(&causal_context()), 1.0);
    }

    #[test]
    fn test_all_and_then_scores_zero() {
        let d = CausalBindingDiagnostic::default();
        assert_eq!(d.score(&episodic_context()), 0.0);
    }

    #[test]
    fn test_no_transitions_is_vacuously_bound() {
        let d = CausalBindingDiagnostic::default();
        assert_eq!(d.score(&empty_context()), 1.0);
        assert_eq!(d.score(&single_scene_context()), 1.0);
        assert_eq!(d.calculate_score(&single_scene_context()), Some(1.0));
    }

    #[test]
    fn test_one_warning_per_and_then_plus_summary() {
        let d = CausalBindingDiagnostic::default();
        let issues = d.run(&episodic_context());
        assert_eq!(issues.len(), 3);
        assert_eq!(
            issues[0].description,
            "Weak AND THEN transition between scene 1 and scene 2"
        );
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].recommendation.as_deref().unwrap().contains("THEREFORE"));

        let summary = issues.last().unwrap();
        assert_eq!(summary.severity, Severity::Critical);
        assert!(summary.description.contains("0%"));
        assert!(summary.recommendation.is_some());
    }

    #[test]
    fn test_strong_binding_only_reports_summary() {
        let d = CausalBindingDiagnostic::default();
        let issues = d.run(&causal_context());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert_eq!(issues[0].category, "causal_binding");
        assert!(issues[0].recommendation.is_none());
    }

    #[test]
    fn test_meanwhile_lowers_score_without_a_warning() {
        let d = CausalBindingDiagnostic::default();
        let ctx = chain(&[Connector::Therefore, Connector::Meanwhile]);
        assert_eq!(d.score(&ctx), 0.5);
        assert_eq!(d.run(&ctx).len(), 1);
    }

    #[test]
    fn test_score_is_monotonic_in_causal_connectors() {
        let d = CausalBindingDiagnostic::default();
        let mut connectors = vec![Connector::AndThen; 4];
        let mut previous = d.score(&chain(&connectors));
        for i in 0..connectors.len() {
            connectors[i] = if i % 2 == 0 { Connector::Therefore } else { Connector::But };
            let current = d.score(&chain(&connectors));
            assert!(current >= previous, "{current} < {previous}");
            previous = current;
        }
        assert_eq!(previous, 1.0);

        for i in 0..connectors.len() {
            connectors[i] = Connector::AndThen;
            let current = d.score(&chain(&connectors));
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_summary_severity_follows_thresholds() {
        let d = CausalBindingDiagnostic::new(DiagnosticThresholds {
            causal_binding_excellent: 0.5,
            ..Default::default()
        });
        let ctx = chain(&[Connector::Therefore, Connector::AndThen]);
        let issues = d.run(&ctx);
        assert_eq!(issues.last().unwrap().severity, Severity::Info);
    }

    #[test]
    fn test_issue_ids_are_stable() {
        let d = CausalBindingDiagnostic::default();
        let a = d.run(&episodic_context());
        let b = d.run(&episodic_context());
        assert_eq!(a, b);
    }
}
