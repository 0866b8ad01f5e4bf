//! Structural diagnostics for narrative scripts
//!
//! Each diagnostic scores one aspect of a [`DiagnosticContext`] and reports
//! issues:
//!
//! - [`CausalBindingDiagnostic`]: BUT/THEREFORE versus AND THEN transitions
//! - [`ReorderabilityDiagnostic`]: adjacent scenes that could be swapped
//! - [`NecessityDiagnostic`]: scenes that duplicate an earlier scene
//! - [`InformationEconomyDiagnostic`]: redundant exposition, missing setups (LLM)
//! - [`FrameworkDiagnostic`]: a study's diagnostic questions (LLM + compendium)
//!
//! [`DiagnosticRunner`] runs them in a fixed order and aggregates the result
//! into a [`DiagnosticReport`](crate::models::DiagnosticReport).
//!
//! [`DiagnosticContext`]: crate::context::DiagnosticContext

mod base;
mod causal_binding;
#[cfg(test)]
mod fixtures;
mod framework;
mod information_economy;
mod necessity;
mod reorderability;
mod runner;
mod thresholds;

pub use base::Diagnostic;
pub use causal_binding::CausalBindingDiagnostic;
pub use framework::{FrameworkDiagnostic, DEFAULT_FRAMEWORK_STUDIES};
pub use information_economy::InformationEconomyDiagnostic;
pub use necessity::NecessityDiagnostic;
pub use reorderability::ReorderabilityDiagnostic;
pub use runner::{create_diagnostic_runner, DiagnosticRunner, DiagnosticSelector, MAX_PRIORITY_FIXES};
pub use thresholds::DiagnosticThresholds;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticError {
    #[error("Unknown diagnostic type: '{0}'. Valid: causal_binding, reorderability, necessity, information_economy, framework")]
    UnknownType(String),
}

/// The diagnostics this crate knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticType {
    CausalBinding,
    Reorderability,
    Necessity,
    InformationEconomy,
    Framework,
}

impl DiagnosticType {
    pub const ALL: [DiagnosticType; 5] = [
        DiagnosticType::CausalBinding,
        DiagnosticType::Reorderability,
        DiagnosticType::Necessity,
        DiagnosticType::InformationEconomy,
        DiagnosticType::Framework,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticType::CausalBinding => "causal_binding",
            DiagnosticType::Reorderability => "reorderability",
            DiagnosticType::Necessity => "necessity",
            DiagnosticType::InformationEconomy => "information_economy",
            DiagnosticType::Framework => "framework",
        }
    }
}

impl FromStr for DiagnosticType {
    type Err = DiagnosticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "causal_binding" | "causal" => Ok(DiagnosticType::CausalBinding),
            "reorderability" | "reorder" => Ok(DiagnosticType::Reorderability),
            "necessity" => Ok(DiagnosticType::Necessity),
            "information_economy" | "economy" => Ok(DiagnosticType::InformationEconomy),
            "framework" => Ok(DiagnosticType::Framework),
            _ => Err(DiagnosticError::UnknownType(s.to_string())),
        }
    }
}

impl std::fmt::Display for DiagnosticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a [0, 1] score as a whole percentage
pub(crate) fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}
