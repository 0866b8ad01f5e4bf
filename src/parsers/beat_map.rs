//! Pre-annotated beat map JSON
//!
//! ```json
//! {
//!   "title": "Script Title",
//!   "scenes": [
//!     {"number": 1, "slug": "INT. LOCATION - DAY", "summary": "...",
//!      "function": "SETUP", "connector": "THEREFORE",
//!      "characters": ["JOHN", "MARY"], "tension": 5}
//!   ],
//!   "characters": ["JOHN", "MARY", "BOB"]
//! }
//! ```
//!
//! Characters may be plain names or `{"name": ...}` records. Unknown
//! connectors are dropped with a warning; missing scene numbers default to
//! position + 1.

use super::{InputError, InputResult};
use crate::context::{clamp_tension, BeatFunction, Connector, DiagnosticContext, Scene};
use serde::Deserialize;
use std::path::Path;

/// Scenes and characters read from a beat map
#[derive(Debug, Clone, PartialEq)]
pub struct BeatMap {
    pub title: String,
    pub scenes: Vec<Scene>,
    pub characters: Vec<String>,
}

impl DiagnosticContext {
    pub fn from_beat_map(beat_map: BeatMap) -> Self {
        DiagnosticContext::new(beat_map.title, beat_map.scenes, beat_map.characters)
    }
}

#[derive(Deserialize)]
struct RawBeatMap {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    scenes: Vec<RawScene>,
    #[serde(default)]
    characters: Vec<RawCharacter>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCharacter {
    Name(String),
    Record {
        #[serde(default)]
        name: String,
    },
}

impl RawCharacter {
    fn into_name(self) -> String {
        match self {
            RawCharacter::Name(name) | RawCharacter::Record { name } => name,
        }
    }
}

#[derive(Deserialize)]
struct RawScene {
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    connector: Option<String>,
    #[serde(default, alias = "characters_present")]
    characters: Vec<RawCharacter>,
    #[serde(default)]
    tension: Option<f64>,
}

impl RawScene {
    fn into_scene(self, position: usize) -> Scene {
        let number = self.number.unwrap_or(position as u32 + 1);
        let mut scene = Scene::new(
            number,
            self.slug.unwrap_or_default(),
            self.summary.unwrap_or_default(),
        )
        .with_characters(
            self.characters
                .into_iter()
                .map(RawCharacter::into_name)
                .filter(|n| !n.is_empty()),
        );
        scene.function = self
            .function
            .filter(|f| !f.trim().is_empty())
            .map(|f| BeatFunction::parse(&f));
        scene.connector = self.connector.as_deref().and_then(Connector::parse_lenient);
        scene.tension = self.tension.map(|t| clamp_tension(t.round() as i64));
        scene
    }
}

/// Read a beat map file; the title defaults to the file stem
pub fn parse_beat_map_json(path: &Path) -> InputResult<BeatMap> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let default_title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_beat_map_str(&content, &default_title).map_err(|e| InputError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn parse_beat_map_str(content: &str, default_title: &str) -> Result<BeatMap, serde_json::Error> {
    let raw: RawBeatMap = serde_json::from_str(content)?;
    Ok(BeatMap {
        title: raw.title.unwrap_or_else(|| default_title.to_string()),
        scenes: raw
            .scenes
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.into_scene(i))
            .collect(),
        characters: raw
            .characters
            .into_iter()
            .map(RawCharacter::into_name)
            .filter(|n| !n.is_empty())
            .collect(),
    })
}
