//! Necessity diagnostic
//!
//! A scene is redundant when an earlier scene already did the same job: same
//! beat function, overlapping cast, similar tension and a near-identical
//! summary. Each redundant scene is reported once, against the first earlier
//! scene it duplicates.

use super::{percent, Diagnostic, DiagnosticThresholds, DiagnosticType};
use crate::context::{DiagnosticContext, Scene};
use crate::models::{DiagnosticIssue, Severity};
use std::collections::HashSet;

/// Word-set Jaccard similarity at which two summaries say the same thing
pub const SUMMARY_SIMILARITY: f64 = 0.5;

/// Tension difference below which two scenes sit at the same pitch
const TENSION_TOLERANCE: i16 = 2;

pub struct NecessityDiagnostic {
    thresholds: DiagnosticThresholds,
}

impl NecessityDiagnostic {
    pub fn new(thresholds: DiagnosticThresholds) -> Self {
        Self { thresholds }
    }

    /// 1 − redundant / total; 1.0 for an empty context
    pub fn score(&self, ctx: &DiagnosticContext) -> f64 {
        let total = ctx.scenes().len();
        if total == 0 {
            return 1.0;
        }
        1.0 - redundant_scenes(ctx.scenes()).len() as f64 / total as f64
    }
}

impl Default for NecessityDiagnostic {
    fn default() -> Self {
        Self::new(DiagnosticThresholds::default())
    }
}

/// `(redundant, duplicate_of)` pairs in scene order
fn redundant_scenes(scenes: &[Scene]) -> Vec<(&Scene, &Scene)> {
    scenes
        .iter()
        .enumerate()
        .filter_map(|(i, later)| {
            scenes[..i]
                .iter()
                .find(|earlier| duplicates(earlier, later))
                .map(|earlier| (later, earlier))
        })
        .collect()
}

fn duplicates(a: &Scene, b: &Scene) -> bool {
    let same_function = matches!((a.beat(), b.beat()), (Some(x), Some(y)) if x == y);
    same_function
        && characters_overlap(a, b)
        && similar_tension(a, b)
        && summary_similarity(&a.summary, &b.summary) >= SUMMARY_SIMILARITY
}

fn characters_overlap(a: &Scene, b: &Scene) -> bool {
    if a.characters.is_empty() && b.characters.is_empty() {
        return true;
    }
    let names: HashSet<String> = a.characters.iter().map(|c| c.to_uppercase()).collect();
    b.characters.iter().any(|c| names.contains(&c.to_uppercase()))
}

fn similar_tension(a: &Scene, b: &Scene) -> bool {
    match (a.tension, b.tension) {
        (Some(x), Some(y)) => (i16::from(x) - i16::from(y)).abs() < TENSION_TOLERANCE,
        _ => true,
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of the two summaries' word sets
pub(crate) fn summary_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (words(a), words(b));
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f64 / union as f64
}

impl Diagnostic for NecessityDiagnostic {
    fn diagnostic_type(&self) -> DiagnosticType {
        DiagnosticType::Necessity
    }

    fn description(&self) -> &'static str {
        "Finds scenes that repeat the work of an earlier scene"
    }

    fn calculate_score(&self, ctx: &DiagnosticContext) -> Option<f64> {
        Some(self.score(ctx))
    }

    fn run(&self, ctx: &DiagnosticContext) -> Vec<DiagnosticIssue> {
        let redundant = redundant_scenes(ctx.scenes());

        let mut issues: Vec<DiagnosticIssue> = redundant
            .iter()
            .map(|(scene, original)| {
                let function = scene.beat().map(|f| f.as_str()).unwrap_or_default();
                self.issue(
                    Severity::Warning,
                    format!(
                        "Scene {} repeats scene {} ({} beat with the same characters)",
                        scene.number, original.number, function
                    ),
                )
                .with_recommendation(format!(
                    "Cut scene {} or merge it into scene {}",
                    scene.number, original.number
                ))
            })
            .collect();

        let score = self.score(ctx);
        let severity = self.thresholds.severity_for_necessity(score);
        let mut summary = self.issue(
            severity,
            format!(
                "Scene necessity: {} ({}/{} scenes are redundant)",
                percent(score),
                redundant.len(),
                ctx.scenes().len()
            ),
        );
        if severity != Severity::Info {
            summary = summary.with_recommendation(
                "Give every scene a distinct job: new information, a turn, or a change in tension",
            );
        }
        issues.push(summary);

        issues
    }
}
