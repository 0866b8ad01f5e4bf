//! Base diagnostic trait

use super::DiagnosticType;
use crate::context::DiagnosticContext;
use crate::models::{DiagnosticIssue, Severity};

/// Trait for all narrative diagnostics
///
/// A diagnostic reads a [`DiagnosticContext`] and never mutates it. It always
/// returns a list of issues: configuration problems (no provider, no
/// compendium) and provider failures become INFO issues instead of errors.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct PacingDiagnostic;
///
/// impl Diagnostic for PacingDiagnostic {
///     fn diagnostic_type(&self) -> DiagnosticType { ... }
///
///     fn description(&self) -> &'static str {
///         "Checks tension pacing"
///     }
///
///     fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64> {
///         Some(1.0)
///     }
///
///     fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
///         vec![]
///     }
/// }
/// ```
pub trait Diagnostic: Send + Sync {
    fn diagnostic_type(&self) -> DiagnosticType;

    /// Human-readable description of what this diagnostic measures
    fn description(&self) -> &'static str;

    /// Whether meaningful output needs an LLM provider
    fn requires_llm(&self) -> bool {
        false
    }

    /// Score in [0, 1], or `None` when it cannot be measured
    fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64>;

    /// Issues found in the context
    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue>;

    /// Score and issues together
    ///
    /// Diagnostics backed by a provider override this so that one provider
    /// call serves both.
    fn evaluate(&self, ctx: &DiagnosticContext) -> (Option<f64>, Vec<DiagnosticIssue>) {
        (self.calculate_score(ctx), self.run(ctx))
    }

    /// Category tag stamped on every issue
    fn category(&self) -> &'static str {
        self.diagnostic_type().as_str()
    }

    fn issue(&self, severity: Severity, description: impl Into<String>) -> DiagnosticIssue
    where
        Self: Sized,
    {
        DiagnosticIssue::new(self.category(), severity, description)
    }
}
