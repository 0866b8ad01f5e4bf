//! Compendium of narratological studies
//!
//! A study is a structural theory of storytelling (Pixar's story rules,
//! Bergman's film grammar, ...) carrying axioms, algorithms and the
//! diagnostic questions framework diagnostics ask of a script.
//!
//! The compendium is loaded once and never mutated afterwards, so it can be
//! shared behind an `Arc` by any number of runners.

mod loader;

pub use loader::{
    load_compendium, load_study, load_study_from_file, study_summaries, StudySummary,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading compendium data
#[derive(Error, Debug)]
pub enum CompendiumError {
    #[error("Compendium file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid compendium JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("Study '{id}' not found. Available studies: {available}")]
    StudyNotFound { id: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CompendiumResult<T> = Result<T, CompendiumError>;

/// Medium a study comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Classical,
    #[default]
    Film,
    Comics,
    Literature,
    Interactive,
    Animation,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Classical => "Classical",
            Category::Film => "Film",
            Category::Comics => "Comics",
            Category::Literature => "Literature",
            Category::Interactive => "Interactive",
            Category::Animation => "Animation",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classical" => Ok(Category::Classical),
            "film" => Ok(Category::Film),
            "comics" => Ok(Category::Comics),
            "literature" => Ok(Category::Literature),
            "interactive" => Ok(Category::Interactive),
            "animation" => Ok(Category::Animation),
            _ => Err(format!(
                "Unknown category '{}'. Valid: Classical, Film, Comics, Literature, Interactive, Animation",
                s
            )),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axiom {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Algorithm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// A yes/no test a study applies to a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticQuestion {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub valid_if: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub work: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
    #[serde(default)]
    pub core_algorithms: Vec<Algorithm>,
    #[serde(default)]
    pub diagnostic_questions: Vec<DiagnosticQuestion>,
    #[serde(default)]
    pub structural_hierarchy: serde_json::Value,
    #[serde(default)]
    pub quick_reference: serde_json::Value,
    #[serde(default)]
    pub theoretical_correspondences: serde_json::Value,
}

impl Study {
    pub fn get_axiom(&self, axiom_id: &str) -> Option<&Axiom> {
        self.axioms.iter().find(|a| a.id == axiom_id)
    }

    /// Find an algorithm by name, ignoring case
    pub fn get_algorithm(&self, name: &str) -> Option<&Algorithm> {
        self.core_algorithms
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Thematic pairing of studies that illuminate each other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePair {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub studies: Vec<String>,
    #[serde(default)]
    pub shared_principles: Vec<String>,
    #[serde(default)]
    pub contrasts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompendiumMeta {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub study_count: usize,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// The full catalog of studies, keyed by study ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compendium {
    #[serde(default)]
    pub meta: CompendiumMeta,
    #[serde(default)]
    pub studies: BTreeMap<String, Study>,
    #[serde(default)]
    pub sequence_pairs: Vec<SequencePair>,
}

impl Compendium {
    pub fn from_studies(studies: impl IntoIterator<Item = Study>) -> Self {
        let studies: BTreeMap<String, Study> =
            studies.into_iter().map(|s| (s.id.clone(), s)).collect();
        let mut categories: Vec<String> = studies
            .values()
            .map(|s| s.category.as_str().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Self {
            meta: CompendiumMeta {
                version: String::new(),
                study_count: studies.len(),
                categories,
            },
            studies,
            sequence_pairs: Vec::new(),
        }
    }

    pub fn get_study(&self, id: &str) -> Option<&Study> {
        self.studies.get(id)
    }

    /// All study IDs in sorted order
    pub fn list_study_ids(&self) -> Vec<String> {
        self.studies.keys().cloned().collect()
    }

    pub fn get_studies_by_category(&self, category: Category) -> Vec<&Study> {
        self.studies
            .values()
            .filter(|s| s.category == category)
            .collect()
    }

    pub fn get_sequence_pairs(&self) -> &[SequencePair] {
        &self.sequence_pairs
    }

    /// Study IDs that define at least one diagnostic question
    pub fn available_frameworks(&self) -> Vec<String> {
        self.studies
            .values()
            .filter(|s| !s.diagnostic_questions.is_empty())
            .map(|s| s.id.clone())
            .collect()
    }

    /// Case-insensitive substring search over axiom IDs, names and statements
    pub fn search_axioms(&self, query: &str) -> Vec<(&str, &Axiom)> {
        let needle = query.to_lowercase();
        self.studies
            .values()
            .flat_map(|study| study.axioms.iter().map(move |a| (study.id.as_str(), a)))
            .filter(|(_, a)| {
                a.id.to_lowercase().contains(&needle)
                    || a.name.to_lowercase().contains(&needle)
                    || a.statement.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Case-insensitive substring search over algorithm names, descriptions and steps
    pub fn search_algorithms(&self, query: &str) -> Vec<(&str, &Algorithm)> {
        let needle = query.to_lowercase();
        self.studies
            .values()
            .flat_map(|study| {
                study
                    .core_algorithms
                    .iter()
                    .map(move |a| (study.id.as_str(), a))
            })
            .filter(|(_, a)| {
                a.name.to_lowercase().contains(&needle)
                    || a.description.to_lowercase().contains(&needle)
                    || a.steps.iter().any(|s| s.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
