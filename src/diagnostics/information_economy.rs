//! Information economy diagnostic (LLM-backed)
//!
//! Structure alone cannot tell whether exposition repeats itself or whether a
//! payoff was never set up, so this diagnostic asks the provider. Without a
//! provider it reports one INFO issue and an unknown score.

use super::{percent, Diagnostic, DiagnosticThresholds, DiagnosticType};
use crate::context::DiagnosticContext;
use crate::llm::{complete_structured, LlmProvider};
use crate::models::{DiagnosticIssue, Severity};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a script editor auditing information economy. \
Flag exposition the audience already has and payoffs that arrive without a setup. \
Be specific: name scenes and facts.";

/// What the provider returns
#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq)]
#[schemars(rename = "InformationEconomy")]
pub struct EconomyAssessment {
    /// Exposition delivered more than once
    #[serde(default)]
    pub redundant_expositions: Vec<String>,
    /// Payoffs or reveals with no earlier setup
    #[serde(default)]
    pub missing_setups: Vec<String>,
    /// 0-1, how efficiently information is delivered
    pub efficiency_score: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

pub struct InformationEconomyDiagnostic {
    provider: Option<Arc<dyn LlmProvider>>,
    thresholds: DiagnosticThresholds,
}

impl InformationEconomyDiagnostic {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, thresholds: DiagnosticThresholds) -> Self {
        Self { provider, thresholds }
    }

    fn build_prompt(ctx: &DiagnosticContext) -> String {
        let scenes = ctx
            .scenes()
            .iter()
            .map(|s| {
                let beat = s.beat().map(|f| format!(" [{f}]")).unwrap_or_default();
                format!("Scene {}{}: {}", s.number, beat, s.summary)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Audit the information economy of this script.\n\n\
             SCRIPT: {}\n\
             CHARACTERS: {}\n\n\
             SCENES:\n{}\n\n\
             List redundant expositions, missing setups, an efficiency score from 0 to 1, \
             and recommendations.",
            ctx.title(),
            ctx.characters().join(", "),
            scenes
        )
    }

    fn assessment_issues(&self, assessment: &EconomyAssessment, score: f64) -> Vec<DiagnosticIssue> {
        let mut issues: Vec<DiagnosticIssue> = assessment
            .redundant_expositions
            .iter()
            .map(|e| {
                self.issue(Severity::Warning, format!("Redundant exposition: {e}"))
                    .with_recommendation("Cut the repeat or let the audience infer it")
            })
            .collect();

        issues.extend(assessment.missing_setups.iter().map(|m| {
            self.issue(Severity::Critical, format!("Missing setup: {m}"))
                .with_recommendation("Plant this earlier so the payoff lands")
        }));

        let mut summary = self.issue(
            self.thresholds.severity_for_information_economy(score),
            format!("Information efficiency: {}", percent(score)),
        );
        if let Some(first) = assessment.recommendations.first() {
            summary = summary.with_recommendation(first.clone());
        }
        issues.push(summary);

        issues
    }

    fn analyze(&self, ctx: &DiagnosticContext) -> (Option<f64>, Vec<DiagnosticIssue>) {
        let Some(provider) = &self.provider else {
            return (
                None,
                vec![self
                    .issue(
                        Severity::Info,
                        "Information economy analysis requires an LLM provider",
                    )
                    .with_recommendation("Configure a provider (--provider ollama|anthropic|openai)")],
            );
        };

        let prompt = Self::build_prompt(ctx);
        match complete_structured::<EconomyAssessment>(&**provider, &prompt, Some(SYSTEM_PROMPT)) {
            Ok(assessment) => {
                let score = assessment.efficiency_score.clamp(0.0, 1.0);
                debug!(
                    "Information economy for '{}': {:.2} ({} redundant, {} missing)",
                    ctx.title(),
                    score,
                    assessment.redundant_expositions.len(),
                    assessment.missing_setups.len()
                );
                (Some(score), self.assessment_issues(&assessment, score))
            }
            Err(e) => {
                warn!("Information economy analysis failed: {}", e);
                (
                    None,
                    vec![self.issue(
                        Severity::Info,
                        format!("Information economy analysis failed: {e}"),
                    )],
                )
            }
        }
    }
}

impl Diagnostic for InformationEconomyDiagnostic {
    fn diagnostic_type(&self) -> DiagnosticType {
        DiagnosticType::InformationEconomy
    }

    fn description(&self) -> &'static str {
        "Detects redundant exposition and missing setups"
    }

    fn requires_llm(&self) -> bool {
        true
    }

    fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64> {
        self.analyze(ctx).0
    }

    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
        self.analyze(ctx).1
    }

    fn evaluate(&self, ctx: &DiagnosticContext) -> (Option<f64>, Vec<DiagnosticIssue>) {
        self.analyze(ctx)
    }
}
