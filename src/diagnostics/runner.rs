//! Diagnostic runner
//!
//! Runs diagnostics against a [`DiagnosticContext`] and folds their results
//! into a [`DiagnosticReport`]. The runner holds only configuration; every
//! call builds fresh metrics, so calling `run_all` twice on the same context
//! with a deterministic provider gives the same report.

use super::{
    CausalBindingDiagnostic, Diagnostic, DiagnosticError, DiagnosticThresholds, DiagnosticType,
    FrameworkDiagnostic, InformationEconomyDiagnostic, NecessityDiagnostic,
    ReorderabilityDiagnostic,
};
use crate::compendium::Compendium;
use crate::context::DiagnosticContext;
use crate::llm::LlmProvider;
use crate::models::{DiagnosticIssue, DiagnosticMetrics, DiagnosticReport, IssuesSummary, Severity};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Most recommendations surfaced as priority fixes
pub const MAX_PRIORITY_FIXES: usize = 5;

/// Which diagnostic `run_single` should dispatch to
///
/// Built from a [`DiagnosticType`] or from a name; names are resolved when
/// the diagnostic runs so that an unknown name surfaces as an error there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticSelector {
    Type(DiagnosticType),
    Name(String),
}

impl DiagnosticSelector {
    pub fn resolve(&self) -> Result<DiagnosticType, DiagnosticError> {
        match self {
            DiagnosticSelector::Type(t) => Ok(*t),
            DiagnosticSelector::Name(name) => name.parse(),
        }
    }
}

impl From<DiagnosticType> for DiagnosticSelector {
    fn from(value: DiagnosticType) -> Self {
        DiagnosticSelector::Type(value)
    }
}

impl From<&str> for DiagnosticSelector {
    fn from(value: &str) -> Self {
        DiagnosticSelector::Name(value.to_string())
    }
}

impl From<String> for DiagnosticSelector {
    fn from(value: String) -> Self {
        DiagnosticSelector::Name(value)
    }
}

/// Orchestrates the diagnostic battery
#[derive(Clone, Default)]
pub struct DiagnosticRunner {
    provider: Option<Arc<dyn LlmProvider>>,
    compendium: Option<Arc<Compendium>>,
    thresholds: DiagnosticThresholds,
}

impl DiagnosticRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_compendium(mut self, compendium: Arc<Compendium>) -> Self {
        self.compendium = Some(compendium);
        self
    }

    pub fn with_thresholds(mut self, thresholds: DiagnosticThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn provider(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.provider.as_ref()
    }

    pub fn compendium(&self) -> Option<&Arc<Compendium>> {
        self.compendium.as_ref()
    }

    pub fn thresholds(&self) -> &DiagnosticThresholds {
        &self.thresholds
    }

    fn causal(&self) -> CausalBindingDiagnostic {
        CausalBindingDiagnostic::new(self.thresholds.clone())
    }

    fn reorderability(&self) -> ReorderabilityDiagnostic {
        ReorderabilityDiagnostic::new(self.thresholds.clone())
    }

    fn necessity(&self) -> NecessityDiagnostic {
        NecessityDiagnostic::new(self.thresholds.clone())
    }

    fn information_economy(&self) -> InformationEconomyDiagnostic {
        InformationEconomyDiagnostic::new(self.provider.clone(), self.thresholds.clone())
    }

    fn framework(&self) -> FrameworkDiagnostic {
        FrameworkDiagnostic::new(
            self.provider.clone(),
            self.compendium.clone(),
            self.thresholds.clone(),
        )
    }

    pub fn run_causal(&self, ctx: &DiagnosticContext) -> (f64, Vec<DiagnosticIssue>) {
        let d = self.causal();
        (d.score(ctx), d.run(ctx))
    }

    pub fn run_reorderability(&self, ctx: &DiagnosticContext) -> (f64, Vec<DiagnosticIssue>) {
        let d = self.reorderability();
        (d.score(ctx), d.run(ctx))
    }

    pub fn run_necessity(&self, ctx: &DiagnosticContext) -> (f64, Vec<DiagnosticIssue>) {
        let d = self.necessity();
        (d.score(ctx), d.run(ctx))
    }

    /// `None` score when no provider is attached or the provider failed
    pub fn run_information_economy(&self, ctx: &DiagnosticContext) -> (Option<f64>, Vec<DiagnosticIssue>) {
        self.information_economy().evaluate(ctx)
    }

    /// Framework issues for `study_ids`, or the default selection when empty
    pub fn run_framework(&self, ctx: &DiagnosticContext, study_ids: &[String]) -> Vec<DiagnosticIssue> {
        self.framework().run_for(ctx, study_ids)
    }

    /// Run one diagnostic by type or case-insensitive name
    pub fn run_single(
        &self,
        kind: impl Into<DiagnosticSelector>,
        ctx: &DiagnosticContext,
    ) -> Result<(Option<f64>, Vec<DiagnosticIssue>), DiagnosticError> {
        let diagnostic: Box<dyn Diagnostic> = match kind.into().resolve()? {
            DiagnosticType::CausalBinding => Box::new(self.causal()),
            DiagnosticType::Reorderability => Box::new(self.reorderability()),
            DiagnosticType::Necessity => Box::new(self.necessity()),
            DiagnosticType::InformationEconomy => Box::new(self.information_economy()),
            DiagnosticType::Framework => Box::new(self.framework()),
        };
        debug!("Running {} diagnostic", diagnostic.diagnostic_type());
        Ok(diagnostic.evaluate(ctx))
    }

    /// Run the full battery and build a report
    ///
    /// Order is fixed: causal binding, reorderability, necessity,
    /// information economy, then framework when `include_framework` is set
    /// and a compendium is attached.
    pub fn run_all(&self, ctx: &DiagnosticContext, include_framework: bool) -> DiagnosticReport {
        info!(
            "Running diagnostics on '{}' ({} scenes)",
            ctx.title(),
            ctx.scenes().len()
        );
        let mut issues = Vec::new();

        let (causal_score, causal_issues) = self.run_causal(ctx);
        debug!("Causal binding: {:.2}", causal_score);
        issues.extend(causal_issues);

        let (reorder_score, reorder_issues) = self.run_reorderability(ctx);
        debug!("Reorderability: {:.2}", reorder_score);
        issues.extend(reorder_issues);

        let (necessity_score, necessity_issues) = self.run_necessity(ctx);
        debug!("Necessity: {:.2}", necessity_score);
        issues.extend(necessity_issues);

        let (economy_score, economy_issues) = self.run_information_economy(ctx);
        debug!("Information economy: {:?}", economy_score);
        issues.extend(economy_issues);

        let mut framework_issues = 0;
        if include_framework && self.compendium.is_some() {
            let found = self.run_framework(ctx, &[]);
            framework_issues = found.len();
            debug!("Framework: {} issues", framework_issues);
            issues.extend(found);
        }

        let mut metrics = DiagnosticMetrics::new(causal_score, reorder_score, necessity_score, economy_score);
        metrics.compute_health(&self.thresholds);

        let issues_summary = IssuesSummary::from_issues(&issues);
        let report = DiagnosticReport {
            title: ctx.title().to_string(),
            metrics,
            critical_count: issues_summary.critical,
            warning_count: issues_summary.warning,
            framework_issues,
            priority_fixes: priority_fixes(&issues),
            issues,
            issues_summary,
        };
        info!(
            "Diagnostics complete: {} health, {} critical, {} warnings",
            report.overall_health(),
            report.critical_count,
            report.warning_count
        );
        report
    }
}

/// Recommendations of CRITICAL issues, then WARNING issues, in run order,
/// deduplicated and capped at [`MAX_PRIORITY_FIXES`]
fn priority_fixes(issues: &[DiagnosticIssue]) -> Vec<String> {
    let mut seen = HashSet::new();
    [Severity::Critical, Severity::Warning]
        .into_iter()
        .flat_map(|severity| issues.iter().filter(move |i| i.severity == severity))
        .filter_map(|i| i.recommendation.as_deref())
        .filter(|rec| !rec.trim().is_empty())
        .filter(|rec| seen.insert(*rec))
        .take(MAX_PRIORITY_FIXES)
        .map(str::to_string)
        .collect()
}

/// Build a runner from optional parts
pub fn create_diagnostic_runner(
    provider: Option<Arc<dyn LlmProvider>>,
    compendium: Option<Arc<Compendium>>,
    thresholds: Option<DiagnosticThresholds>,
) -> DiagnosticRunner {
    DiagnosticRunner {
        provider,
        compendium,
        thresholds: thresholds.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compendium::tests::sample_compendium;
    use crate::diagnostics::fixtures::{causal_context, episodic_context};
    use crate::llm::{MockProvider, MockResponse};
    use crate::models::HealthLabel;
    use serde_json::json;

    fn issue(severity: Severity, rec: Option<&str>) -> DiagnosticIssue {
        let i = DiagnosticIssue::new("test", severity, format!("{severity} {rec:?}"));
        match rec {
            Some(r) => i.with_recommendation(r),
            None => i,
        }
    }

    #[test]
    fn test_new_runner_has_defaults() {
        let runner = DiagnosticRunner::new();
        assert!(runner.provider().is_none());
        assert!(runner.compendium().is_none());
        assert_eq!(runner.thresholds(), &DiagnosticThresholds::default());
    }

    #[test]
    fn test_create_with_thresholds() {
        let thresholds = DiagnosticThresholds {
            causal_binding_excellent: 0.95,
            ..Default::default()
        };
        let runner = create_diagnostic_runner(None, None, Some(thresholds));
        assert_eq!(runner.thresholds().causal_binding_excellent, 0.95);
    }

    #[test]
    fn test_individual_runs_stay_in_range() {
        let runner = DiagnosticRunner::new();
        let ctx = causal_context();
        for (score, issues) in [
            runner.run_causal(&ctx),
            runner.run_reorderability(&ctx),
            runner.run_necessity(&ctx),
        ] {
            assert!((0.0..=1.0).contains(&score));
            assert!(!issues.is_empty());
        }
    }

    #[test]
    fn test_run_all_on_causal_chain() {
        let report = DiagnosticRunner::new().run_all(&causal_context(), false);
        assert_eq!(report.title, "The Map");
        assert_eq!(report.metrics.causal_binding_ratio, 1.0);
        assert!(matches!(report.overall_health(), "Excellent" | "Good"));
        assert_eq!(report.metrics.information_economy_score, None);
        assert_eq!(report.framework_issues, 0);
    }

    #[test]
    fn test_run_all_on_episodic_chain() {
        let report = DiagnosticRunner::new().run_all(&episodic_context(), false);
        assert_eq!(report.metrics.causal_binding_ratio, 0.0);
        assert_eq!(report.overall_health(), "Critical");
        assert!(report.critical_count >= 1);
        assert!(!report.priority_fixes.is_empty());
        assert!(report.priority_fixes.len() <= MAX_PRIORITY_FIXES);
    }

    #[test]
    fn test_run_all_is_idempotent() {
        let runner = DiagnosticRunner::new().with_provider(Arc::new(MockProvider::new()));
        let ctx = episodic_context();
        let first = runner.run_all(&ctx, false);
        let second = runner.run_all(&ctx, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_framework_requires_flag_and_compendium() {
        let ctx = causal_context();
        let without = DiagnosticRunner::new().run_all(&ctx, true);
        assert_eq!(without.framework_issues, 0);

        let runner = DiagnosticRunner::new().with_compendium(Arc::new(sample_compendium()));
        let skipped = runner.run_all(&ctx, false);
        assert_eq!(skipped.framework_issues, 0);

        let included = runner.run_all(&ctx, true);
        assert_eq!(included.framework_issues, 2);
        assert!(included.issues.iter().any(|i| i.category == "framework"));
    }

    #[test]
    fn test_run_all_order_is_fixed() {
        let runner = DiagnosticRunner::new().with_compendium(Arc::new(sample_compendium()));
        let report = runner.run_all(&causal_context(), true);
        let mut categories: Vec<&str> = report.issues.iter().map(|i| i.category.as_str()).collect();
        categories.dedup();
        assert_eq!(
            categories,
            vec![
                "causal_binding",
                "reorderability",
                "necessity",
                "information_economy",
                "framework"
            ]
        );
    }

    #[test]
    fn test_economy_score_flows_into_metrics() {
        let mock = Arc::new(MockProvider::new());
        mock.push(MockResponse::structured(json!({"efficiency_score": 0.9})));
        let runner = DiagnosticRunner::new().with_provider(mock);
        let report = runner.run_all(&causal_context(), false);
        assert_eq!(report.metrics.information_economy_score, Some(0.9));
        assert_eq!(
            report.metrics.information_economy_health,
            Some(HealthLabel::Excellent)
        );
    }

    #[test]
    fn test_run_single_by_type_and_name() {
        let runner = DiagnosticRunner::new();
        let ctx = episodic_context();
        let (score, issues) = runner.run_single(DiagnosticType::CausalBinding, &ctx).unwrap();
        assert_eq!(score, Some(0.0));
        assert_eq!(issues.len(), 3);

        let (score, _) = runner.run_single("REORDERABILITY", &ctx).unwrap();
        assert_eq!(score, Some(1.0));

        let (score, issues) = runner.run_single(String::from("information_economy"), &ctx).unwrap();
        assert_eq!(score, None);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_run_single_unknown_name() {
        let err = DiagnosticRunner::new()
            .run_single("pacing", &causal_context())
            .unwrap_err();
        assert_eq!(err, DiagnosticError::UnknownType("pacing".into()));
    }

    #[test]
    fn test_priority_fixes_order_dedupe_and_cap() {
        let issues = vec![
            issue(Severity::Warning, Some("warn-1")),
            issue(Severity::Critical, Some("crit-1")),
            issue(Severity::Info, Some("info")),
            issue(Severity::Warning, Some("crit-1")),
            issue(Severity::Critical, None),
            issue(Severity::Critical, Some("crit-2")),
            issue(Severity::Warning, Some("warn-2")),
            issue(Severity::Suggestion, Some("suggest")),
            issue(Severity::Warning, Some("warn-3")),
            issue(Severity::Warning, Some("warn-4")),
        ];
        assert_eq!(
            priority_fixes(&issues),
            vec!["crit-1", "crit-2", "warn-1", "warn-2", "warn-3"]
        );
    }
}
