//! Loading compendium and study JSON from disk

use super::{Compendium, CompendiumError, CompendiumResult, Study};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Load the full compendium from a unified JSON file
pub fn load_compendium(path: &Path) -> CompendiumResult<Compendium> {
    let content = read_json_file(path)?;
    let mut compendium: Compendium =
        serde_json::from_str(&content).map_err(|e| CompendiumError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // Study IDs inside the records win over map keys
    let studies = std::mem::take(&mut compendium.studies);
    compendium.studies = studies
        .into_values()
        .map(|study| (study.id.clone(), study))
        .collect();
    if compendium.meta.study_count == 0 {
        compendium.meta.study_count = compendium.studies.len();
    }

    info!(
        "Loaded compendium from {} ({} studies)",
        path.display(),
        compendium.studies.len()
    );
    Ok(compendium)
}

/// Load a single study out of the compendium at `path`
pub fn load_study(study_id: &str, path: &Path) -> CompendiumResult<Study> {
    let compendium = load_compendium(path)?;
    match compendium.get_study(study_id) {
        Some(study) => Ok(study.clone()),
        None => Err(CompendiumError::StudyNotFound {
            id: study_id.to_string(),
            available: compendium.list_study_ids().join(", "),
        }),
    }
}

/// Load a study from its own JSON file
pub fn load_study_from_file(path: &Path) -> CompendiumResult<Study> {
    let content = read_json_file(path)?;
    let study: Study = serde_json::from_str(&content).map_err(|e| CompendiumError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!("Loaded study '{}' from {}", study.id, path.display());
    Ok(study)
}

/// One-line overview of a study, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySummary {
    pub id: String,
    pub creator: String,
    pub work: String,
    pub category: String,
    pub axiom_count: usize,
    pub algorithm_count: usize,
    pub question_count: usize,
}

pub fn study_summaries(compendium: &Compendium) -> Vec<StudySummary> {
    compendium
        .studies
        .values()
        .map(|study| StudySummary {
            id: study.id.clone(),
            creator: study.creator.clone(),
            work: study.work.clone(),
            category: study.category.to_string(),
            axiom_count: study.axioms.len(),
            algorithm_count: study.core_algorithms.len(),
            question_count: study.diagnostic_questions.len(),
        })
        .collect()
}

fn read_json_file(path: &Path) -> CompendiumResult<String> {
    if !path.exists() {
        return Err(CompendiumError::NotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compendium::tests::sample_compendium;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_compendium_roundtrip() {
        let json = serde_json::to_string(&sample_compendium()).unwrap();
        let file = write_temp(&json);
        let loaded = load_compendium(file.path()).unwrap();
        assert_eq!(loaded.list_study_ids(), vec!["bergman", "pixar"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_compendium(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CompendiumError::NotFound(_)));
    }

    #[test]
    fn test_invalid_json_is_distinct_error() {
        let file = write_temp("{ not json");
        let err = load_compendium(file.path()).unwrap_err();
        assert!(matches!(err, CompendiumError::InvalidJson { .. }));
    }

    #[test]
    fn test_load_study_not_found_lists_available() {
        let json = serde_json::to_string(&sample_compendium()).unwrap();
        let file = write_temp(&json);
        let err = load_study("kurosawa", file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("kurosawa"));
        assert!(message.contains("bergman, pixar"));
    }

    #[test]
    fn test_load_study_from_file() {
        let file = write_temp(r#"{"id": "solo", "creator": "Someone", "category": "Comics"}"#);
        let study = load_study_from_file(file.path()).unwrap();
        assert_eq!(study.id, "solo");
        assert!(study.diagnostic_questions.is_empty());
    }

    #[test]
    fn test_summaries_count_items() {
        let summaries = study_summaries(&sample_compendium());
        let pixar = summaries.iter().find(|s| s.id == "pixar").unwrap();
        assert_eq!(pixar.question_count, 2);
        assert_eq!(pixar.algorithm_count, 1);
        assert_eq!(pixar.category, "Animation");
    }
}
