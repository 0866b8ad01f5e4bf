//! Diagnostic context: the normalized view of a script every diagnostic reads
//!
//! A context is built once per analysis, either from a parsed script
//! (annotation-free scenes) or from a pre-annotated beat map, and is
//! read-only while diagnostics run.

mod scene;

pub use scene::{clamp_tension, BeatFunction, Connector, Scene, SceneTransition, TENSION_RANGE};

use crate::parsers::Script;
use serde::{Deserialize, Serialize};

/// The unit of analysis handed to every diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticContext {
    title: String,
    scenes: Vec<Scene>,
    characters: Vec<String>,
    transitions: Vec<SceneTransition>,
    beat_map_available: bool,
    active_studies: Vec<String>,
}

impl DiagnosticContext {
    /// Build a context, deriving transitions and beat-map availability
    pub fn new(title: impl Into<String>, scenes: Vec<Scene>, characters: Vec<String>) -> Self {
        let transitions = derive_transitions(&scenes);
        let beat_map_available = scenes.iter().any(|s| s.beat().is_some());
        Self {
            title: title.into(),
            scenes,
            characters,
            transitions,
            beat_map_available,
            active_studies: Vec::new(),
        }
    }

    /// Build a context from a parsed script
    pub fn from_script(script: &Script) -> Self {
        Self::new(
            script.title.clone(),
            script.scenes.clone(),
            script.characters.clone(),
        )
    }

    /// Restrict framework diagnostics to these study IDs
    pub fn with_active_studies<I, S>(mut self, studies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_studies = studies.into_iter().map(Into::into).collect();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn characters(&self) -> &[String] {
        &self.characters
    }

    pub fn transitions(&self) -> &[SceneTransition] {
        &self.transitions
    }

    /// True when at least one scene carries a beat function
    pub fn beat_map_available(&self) -> bool {
        self.beat_map_available
    }

    pub fn active_studies(&self) -> &[String] {
        &self.active_studies
    }
}

/// One transition per adjacent scene pair
fn derive_transitions(scenes: &[Scene]) -> Vec<SceneTransition> {
    scenes
        .windows(2)
        .map(|pair| SceneTransition::between(&pair[0], &pair[1]))
        .collect()
}
