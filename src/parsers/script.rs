//! Heuristic screenplay parser
//!
//! Scenes are split on sluglines (`INT.`, `EXT.`, `INT/EXT.`, `I/E.`). Prose
//! without sluglines falls back to one scene per substantial paragraph.

use super::{InputError, InputResult, Script};
use crate::context::Scene;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

static SLUGLINE: OnceLock<Regex> = OnceLock::new();
static CHARACTER_CUE: OnceLock<Regex> = OnceLock::new();
static PARENTHETICAL: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_BREAK: OnceLock<Regex> = OnceLock::new();

fn slugline() -> &'static Regex {
    SLUGLINE.get_or_init(|| {
        Regex::new(r"(?im)^(INT\.|EXT\.|INT/EXT\.|I/E\.)\s+(.+?)(?:\s*[-–—]\s*(.+))?$")
            .expect("valid regex")
    })
}

fn character_cue() -> &'static Regex {
    CHARACTER_CUE.get_or_init(|| Regex::new(r"^([A-Z][A-Z\s.']+)(?:\s*\(.*\))?$").expect("valid regex"))
}

fn parenthetical() -> &'static Regex {
    PARENTHETICAL.get_or_init(|| Regex::new(r"^\(.+\)$").expect("valid regex"))
}

fn paragraph_break() -> &'static Regex {
    PARAGRAPH_BREAK.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid regex"))
}

/// Uppercase lines that look like cues but are transitions
const NON_CHARACTER_CUES: &[&str] = &[
    "CONTINUED",
    "FADE IN",
    "FADE OUT",
    "CUT TO",
    "DISSOLVE TO",
    "THE END",
];

const LINES_PER_PAGE: usize = 55;
const MIN_PARAGRAPH_CHARS: usize = 50;
const SUMMARY_CHARS: usize = 200;

/// Parse a script file; `title` defaults to the title-cased file stem
pub fn parse_script(path: &Path, title: Option<&str>) -> InputResult<Script> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| title_from_path(path));
    Ok(parse_script_text(&text, &title))
}

/// Parse screenplay text already in memory
pub fn parse_script_text(text: &str, title: &str) -> Script {
    let text = text.replace("\r\n", "\n");

    let mut scenes = scenes_by_sluglines(&text);
    if scenes.is_empty() {
        debug!("No sluglines in '{}', splitting on paragraphs", title);
        scenes = scenes_by_paragraphs(&text);
    }

    let line_count = text.matches('\n').count();

    Script {
        title: title.to_string(),
        format: "Feature".to_string(),
        page_count: (line_count / LINES_PER_PAGE).max(1),
        scenes,
        characters: characters_in(&text),
    }
}

/// `my_great-script.txt` becomes `My Great Script`
pub fn title_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn scenes_by_sluglines(text: &str) -> Vec<Scene> {
    let matches: Vec<_> = slugline().captures_iter(text).collect();

    matches
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            let content = text[whole.end()..end].trim();

            let int_ext = caps.get(1)?.as_str().to_uppercase();
            let location = caps.get(2)?.as_str().trim();
            let mut slug = format!("{int_ext} {location}");
            if let Some(time) = caps.get(3).map(|m| m.as_str().trim()).filter(|t| !t.is_empty()) {
                slug.push_str(" - ");
                slug.push_str(time);
            }

            Some(
                Scene::new((i + 1) as u32, slug, summarize(content))
                    .with_characters(characters_in(content)),
            )
        })
        .collect()
}

fn scenes_by_paragraphs(text: &str) -> Vec<Scene> {
    let trimmed = text.trim();
    let paragraphs: Vec<&str> = paragraph_break()
        .split(trimmed)
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    if paragraphs.is_empty() {
        return vec![Scene::new(1, "SCENE 1", truncate_with_ellipsis(trimmed, SUMMARY_CHARS))
            .with_characters(characters_in(text))];
    }

    paragraphs
        .iter()
        .enumerate()
        .map(|(i, para)| {
            Scene::new(
                (i + 1) as u32,
                format!("SCENE {}", i + 1),
                truncate_with_ellipsis(para, SUMMARY_CHARS),
            )
            .with_characters(characters_in(para))
        })
        .collect()
}

/// First three lines that are neither cues nor parentheticals
fn summarize(content: &str) -> String {
    let summary = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !character_cue().is_match(line) && !parenthetical().is_match(line))
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if summary.is_empty() {
        return "Scene content".to_string();
    }
    if summary.chars().count() > SUMMARY_CHARS {
        let cut: String = summary.chars().take(SUMMARY_CHARS - 3).collect();
        return format!("{cut}...");
    }
    summary
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.trim().to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim())
}

/// Sorted, de-duplicated character cue names
fn characters_in(content: &str) -> Vec<String> {
    let names: BTreeSet<String> = content
        .lines()
        .filter_map(|line| character_cue().captures(line.trim()))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|name| !NON_CHARACTER_CUES.contains(&name.as_str()))
        .collect();
    names.into_iter().collect()
}
