//! Input parsing: raw scripts and pre-annotated beat maps
//!
//! Both paths end in a [`DiagnosticContext`]. Raw scripts go through
//! slugline-based scene detection and produce annotation-free scenes; beat
//! maps already carry function, connector and tension per scene.

mod beat_map;
mod script;

pub use beat_map::{parse_beat_map_json, parse_beat_map_str, BeatMap};
pub use script::{parse_script, parse_script_text, title_from_path};

use crate::context::{DiagnosticContext, Scene};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading caller-supplied input files
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type InputResult<T> = Result<T, InputError>;

/// A script after heuristic scene detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub format: String,
    pub page_count: usize,
    pub scenes: Vec<Scene>,
    pub characters: Vec<String>,
}

/// Load a script or beat map and build its diagnostic context
///
/// `.json` files are read as beat maps; anything else is parsed as a
/// script. `title` overrides whatever title the input carries. The parsed
/// script is returned alongside the context when there is one.
pub fn load_input(
    path: &Path,
    title: Option<&str>,
) -> InputResult<(Option<Script>, DiagnosticContext)> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        debug!("Reading {} as a beat map", path.display());
        let mut beat_map = parse_beat_map_json(path)?;
        if let Some(title) = title {
            beat_map.title = title.to_string();
        }
        return Ok((None, DiagnosticContext::from_beat_map(beat_map)));
    }

    debug!("Reading {} as a script", path.display());
    let script = parse_script(path, title)?;
    let context = DiagnosticContext::from_script(&script);
    Ok((Some(script), context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_not_found() {
        let err = load_input(Path::new("/no/such/file.json"), None).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn test_json_extension_dispatches_to_beat_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.JSON");
        std::fs::write(
            &path,
            r#"{"title": "Map", "scenes": [{"number": 1, "function": "SETUP", "connector": "BUT"}, {"number": 2}]}"#,
        )
        .unwrap();
        let (script, ctx) = load_input(&path, None).unwrap();
        assert!(script.is_none());
        assert_eq!(ctx.title(), "Map");
        assert!(ctx.beat_map_available());
        assert_eq!(ctx.transitions().len(), 1);
    }

    #[test]
    fn test_invalid_json_is_distinct_from_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = load_input(&path, None).unwrap_err();
        assert!(matches!(err, InputError::InvalidJson { .. }));
    }

    #[test]
    fn test_text_input_yields_script_and_title_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my_script.txt");
        std::fs::write(&path, "INT. ROOM - DAY\n\nAnna waits.\n").unwrap();
        let (script, ctx) = load_input(&path, Some("Override")).unwrap();
        assert_eq!(script.unwrap().title, "Override");
        assert_eq!(ctx.title(), "Override");
        assert!(!ctx.beat_map_available());
    }
}
