//! Framework diagnostic: apply a study's diagnostic questions to a script
//!
//! Each study in the compendium carries questions with a `valid_if`
//! criterion. With a provider, every study gets one prompt and every failed
//! question becomes an issue. Without a provider, the diagnostic only reports
//! how many questions each study would ask.
//!
//! Framework results carry no scalar score; [`Diagnostic::calculate_score`]
//! always returns 1.0.

use super::{percent, Diagnostic, DiagnosticThresholds, DiagnosticType};
use crate::compendium::{Compendium, DiagnosticQuestion};
use crate::context::DiagnosticContext;
use crate::llm::{complete_structured, LlmProvider};
use crate::models::{DiagnosticIssue, Severity};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Studies checked when neither the caller nor the context names any
pub const DEFAULT_FRAMEWORK_STUDIES: [&str; 3] = ["pixar", "bergman", "tarantino"];

/// Scenes embedded in one evaluation prompt
const MAX_PROMPT_SCENES: usize = 25;
/// Questions embedded in one evaluation prompt
const MAX_PROMPT_QUESTIONS: usize = 10;

const DEFAULT_RECOMMENDATION: &str = "Review against framework guidelines";

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq)]
pub struct QuestionVerdict {
    pub question_id: String,
    pub is_valid: bool,
    pub explanation: String,
    /// critical, warning, suggestion or info
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub recommendation: Option<String>,
}

fn default_severity() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq)]
pub struct FrameworkAssessment {
    #[serde(default)]
    pub responses: Vec<QuestionVerdict>,
    /// 0-1 alignment with the framework
    #[serde(default)]
    pub overall_alignment: f64,
    #[serde(default)]
    pub summary: String,
}

pub struct FrameworkDiagnostic {
    provider: Option<Arc<dyn LlmProvider>>,
    compendium: Option<Arc<Compendium>>,
    thresholds: DiagnosticThresholds,
}

impl FrameworkDiagnostic {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        compendium: Option<Arc<Compendium>>,
        thresholds: DiagnosticThresholds,
    ) -> Self {
        Self {
            provider,
            compendium,
            thresholds,
        }
    }

    /// Study IDs with at least one diagnostic question
    pub fn available_frameworks(&self) -> Vec<String> {
        self.compendium
            .as_deref()
            .map(Compendium::available_frameworks)
            .unwrap_or_default()
    }

    /// Number of questions a study asks; 0 for unknown studies
    pub fn question_count(&self, study_id: &str) -> usize {
        self.compendium
            .as_deref()
            .and_then(|c| c.get_study(study_id))
            .map_or(0, |s| s.diagnostic_questions.len())
    }

    /// Run the given studies, or the default selection when `study_ids` is empty
    pub fn run_for(&self, ctx: &DiagnosticContext, study_ids: &[String]) -> Vec<DiagnosticIssue> {
        let Some(compendium) = self.compendium.as_deref() else {
            return vec![self
                .issue(Severity::Info, "No compendium loaded for framework diagnostics")
                .with_recommendation("Pass --compendium or set `compendium` in narratological.toml")];
        };

        let studies = resolve_studies(compendium, ctx, study_ids);
        debug!("Framework studies for '{}': {:?}", ctx.title(), studies);

        studies
            .iter()
            .flat_map(|id| self.run_study(compendium, ctx, id))
            .collect()
    }

    fn run_study(&self, compendium: &Compendium, ctx: &DiagnosticContext, study_id: &str) -> Vec<DiagnosticIssue> {
        let Some(study) = compendium.get_study(study_id) else {
            return vec![self.issue(
                Severity::Info,
                format!("Study '{study_id}' not found in compendium"),
            )];
        };
        let questions = &study.diagnostic_questions;

        let Some(provider) = &self.provider else {
            return vec![self.issue(
                Severity::Info,
                format!(
                    "Study '{study_id}' has {} diagnostic questions (LLM required to evaluate)",
                    questions.len()
                ),
            )];
        };

        if questions.is_empty() {
            return Vec::new();
        }

        let prompt = build_evaluation_prompt(ctx, study_id, questions);
        let system = build_system_prompt(study_id);
        match complete_structured::<FrameworkAssessment>(&**provider, &prompt, Some(&system)) {
            Ok(assessment) => {
                info!(
                    "{} framework: {} of {} answers invalid, alignment {:.2}",
                    study_id,
                    assessment.responses.iter().filter(|r| !r.is_valid).count(),
                    assessment.responses.len(),
                    assessment.overall_alignment
                );
                self.assessment_issues(study_id, assessment)
            }
            Err(e) => {
                warn!("Framework evaluation for '{}' failed: {}", study_id, e);
                vec![self.issue(
                    Severity::Info,
                    format!("Failed to evaluate {study_id} framework: {e}"),
                )]
            }
        }
    }

    fn assessment_issues(&self, study_id: &str, assessment: FrameworkAssessment) -> Vec<DiagnosticIssue> {
        let mut issues: Vec<DiagnosticIssue> = assessment
            .responses
            .into_iter()
            .filter(|r| !r.is_valid)
            .map(|r| {
                self.issue(
                    Severity::from_llm_label(&r.severity),
                    format!("[{study_id}] {}", r.explanation),
                )
                .with_recommendation(
                    r.recommendation
                        .filter(|rec| !rec.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
                )
            })
            .collect();

        if assessment.overall_alignment < self.thresholds.framework_alignment_min {
            issues.push(
                self.issue(
                    Severity::Warning,
                    format!(
                        "Low alignment with {study_id} framework: {}",
                        percent(assessment.overall_alignment)
                    ),
                )
                .with_recommendation(assessment.summary),
            );
        }

        issues
    }
}

/// Explicit IDs, then the context's active studies, then the defaults that
/// exist, then every study with questions
fn resolve_studies(compendium: &Compendium, ctx: &DiagnosticContext, study_ids: &[String]) -> Vec<String> {
    if !study_ids.is_empty() {
        return study_ids.to_vec();
    }
    if !ctx.active_studies().is_empty() {
        return ctx.active_studies().to_vec();
    }
    let defaults: Vec<String> = DEFAULT_FRAMEWORK_STUDIES
        .iter()
        .filter(|id| compendium.get_study(id).is_some())
        .map(|id| id.to_string())
        .collect();
    if defaults.is_empty() {
        compendium.available_frameworks()
    } else {
        defaults
    }
}

fn build_system_prompt(study_id: &str) -> String {
    format!(
        "You are evaluating a script against the diagnostic questions from the {study_id} \
         narratological framework.\n\n\
         For each question, determine:\n\
         1. Whether the script satisfies the criterion\n\
         2. If not, what's missing and how to address it\n\
         3. The severity of any issues found\n\n\
         Be specific and actionable in your recommendations."
    )
}

fn build_evaluation_prompt(ctx: &DiagnosticContext, study_id: &str, questions: &[DiagnosticQuestion]) -> String {
    let scenes = ctx
        .scenes()
        .iter()
        .take(MAX_PROMPT_SCENES)
        .map(|s| format!("Scene {}: {}", s.number, s.summary))
        .collect::<Vec<_>>()
        .join("\n");

    let questions = questions
        .iter()
        .take(MAX_PROMPT_QUESTIONS)
        .map(|q| format!("{}. {}\n   Valid if: {}", q.id, q.question, q.valid_if))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Evaluate this script against the {study_id} framework diagnostic questions.\n\n\
         SCRIPT: {}\n\n\
         SCENES:\n{scenes}\n\n\
         DIAGNOSTIC QUESTIONS:\n{questions}\n\n\
         For each question, respond with:\n\
         - question_id: The question ID\n\
         - is_valid: Whether the script passes this test\n\
         - explanation: Why it passes or fails\n\
         - severity: If failing, how serious (critical, warning, info, suggestion)\n\
         - recommendation: If failing, how to fix it\n\n\
         Also provide:\n\
         - overall_alignment: Float 0-1 for overall framework alignment\n\
         - summary: Brief summary of framework fit",
        ctx.title()
    )
}

impl Diagnostic for FrameworkDiagnostic {
    fn diagnostic_type(&self) -> DiagnosticType {
        DiagnosticType::Framework
    }

    fn description(&self) -> &'static str {
        "Applies study-specific diagnostic questions"
    }

    fn requires_llm(&self) -> bool {
        true
    }

    fn calculate_score(&self, _ctx: &DiagnosticContext) -> Option<f64> {
        Some(1.0)
    }

    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
        self.run_for(ctx, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compendium::tests::sample_compendium;
    use crate::context::Scene;
    use crate::diagnostics::fixtures::causal_context;
    use crate::llm::{MockProvider, MockResponse};
    use serde_json::json;

    fn diagnostic(mock: Option<&Arc<MockProvider>>) -> FrameworkDiagnostic {
        let provider = mock.map(|m| {
            let p: Arc<dyn LlmProvider> = m.clone();
            p
        });
        FrameworkDiagnostic::new(
            provider,
            Some(Arc::new(sample_compendium())),
            DiagnosticThresholds::default(),
        )
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_compendium() {
        let d = FrameworkDiagnostic::new(None, None, DiagnosticThresholds::default());
        let issues = d.run(&causal_context());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description, "No compendium loaded for framework diagnostics");
        assert!(d.available_frameworks().is_empty());
        assert_eq!(d.question_count("pixar"), 0);
    }

    #[test]
    fn test_unknown_study_without_provider() {
        let issues = diagnostic(None).run_for(&causal_context(), &ids(&["does-not-exist"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert_eq!(issues[0].description, "Study 'does-not-exist' not found in compendium");
        assert_eq!(issues[0].category, "framework");
    }

    #[test]
    fn test_unknown_study_with_provider_never_calls_it() {
        let mock = Arc::new(MockProvider::new());
        let issues = diagnostic(Some(&mock)).run_for(&causal_context(), &ids(&["does-not-exist"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(issues[0].description.contains("not found"));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_without_provider_reports_question_counts() {
        let issues = diagnostic(None).run(&causal_context());
        let descriptions: Vec<&str> = issues.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Study 'pixar' has 2 diagnostic questions (LLM required to evaluate)",
                "Study 'bergman' has 0 diagnostic questions (LLM required to evaluate)",
            ]
        );
        assert!(issues.iter().all(|i| i.severity == Severity::Info));
    }

    #[test]
    fn test_active_studies_take_precedence_over_defaults() {
        let ctx = causal_context().with_active_studies(["bergman"]);
        let issues = diagnostic(None).run(&ctx);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.contains("'bergman'"));
    }

    #[test]
    fn test_invalid_answers_become_issues() {
        let mock = Arc::new(MockProvider::new());
        mock.push(MockResponse::structured(json!({
            "responses": [
                {"question_id": "PX-Q1", "is_valid": true, "explanation": "Maya wants the vault"},
                {"question_id": "PX-Q2", "is_valid": false, "explanation": "Scene 3 arrives by accident",
                 "severity": "CRITICAL", "recommendation": "Motivate the theft"},
                {"question_id": "PX-Q3", "is_valid": false, "explanation": "Unclear stakes",
                 "severity": "urgent"}
            ],
            "overall_alignment": 0.9,
            "summary": "Mostly aligned"
        })));
        let d = diagnostic(Some(&mock));
        let issues = d.run_for(&causal_context(), &ids(&["pixar"]));

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].description, "[pixar] Scene 3 arrives by accident");
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].recommendation.as_deref(), Some("Motivate the theft"));
        assert_eq!(issues[1].severity, Severity::Warning);
        assert_eq!(
            issues[1].recommendation.as_deref(),
            Some("Review against framework guidelines")
        );
    }

    #[test]
    fn test_low_alignment_adds_warning() {
        let mock = Arc::new(MockProvider::new());
        mock.push(MockResponse::structured(json!({
            "responses": [],
            "overall_alignment": 0.4,
            "summary": "Scenes are loosely connected"
        })));
        let issues = diagnostic(Some(&mock)).run_for(&causal_context(), &ids(&["pixar"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description, "Low alignment with pixar framework: 40%");
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(
            issues[0].recommendation.as_deref(),
            Some("Scenes are loosely connected")
        );
    }

    #[test]
    fn test_study_without_questions_is_skipped_with_provider() {
        let mock = Arc::new(MockProvider::new());
        let issues = diagnostic(Some(&mock)).run_for(&causal_context(), &ids(&["bergman"]));
        assert!(issues.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_provider_error_becomes_single_info() {
        let mock = Arc::new(MockProvider::new());
        mock.push(MockResponse::error("timeout"));
        let issues = diagnostic(Some(&mock)).run_for(&causal_context(), &ids(&["pixar"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(issues[0].description.starts_with("Failed to evaluate pixar framework:"));
        assert!(issues[0].description.contains("timeout"));
    }

    #[test]
    fn test_prompt_is_truncated() {
        let scenes = (1..=30)
            .map(|i| Scene::new(i, "", format!("summary number {i}")))
            .collect();
        let ctx = DiagnosticContext::new("Long", scenes, vec![]);
        let mock = Arc::new(MockProvider::new());
        diagnostic(Some(&mock)).run_for(&ctx, &ids(&["pixar"]));

        let call = mock.last_call().unwrap();
        assert!(call.prompt.contains("Scene 25: summary number 25"));
        assert!(!call.prompt.contains("Scene 26:"));
        assert!(call.prompt.contains("PX-Q2. Are scenes causally linked?\n   Valid if: Most transitions"));
        assert!(call.system.unwrap().contains("pixar"));
    }

    #[test]
    fn test_malformed_verdict_becomes_single_info() {
        let mock = Arc::new(MockProvider::new());
        mock.push(MockResponse::structured(json!({
            "responses": [{"question_id": "PX-Q1", "is_valid": "no", "explanation": "x"}]
        })));
        let issues = diagnostic(Some(&mock)).run_for(&causal_context(), &ids(&["pixar"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(issues[0].description.contains("/responses/0/is_valid"));
        assert_eq!(mock.last_call().unwrap().schema.as_deref(), Some("FrameworkAssessment"));
    }

    #[test]
    fn test_score_is_constant() {
        assert_eq!(diagnostic(None).calculate_score(&causal_context()), Some(1.0));
    }

    #[test]
    fn test_helpers() {
        let d = diagnostic(None);
        assert_eq!(d.available_frameworks(), vec!["pixar"]);
        assert_eq!(d.question_count("pixar"), 2);
        assert_eq!(d.question_count("does-not-exist"), 0);
    }
}
