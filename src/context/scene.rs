//! Scene-level vocabulary: beat functions, connectors, scenes, transitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Narrative role a scene plays
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BeatFunction {
    Setup,
    Incite,
    Escalate,
    Reveal,
    Crisis,
    Climax,
    Resolve,
    Complicate,
    Breathe,
    Plant,
    Payoff,
    /// Any label outside the standard vocabulary, stored uppercase
    Other(String),
}

impl BeatFunction {
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_uppercase();
        match normalized.as_str() {
            "SETUP" => BeatFunction::Setup,
            "INCITE" => BeatFunction::Incite,
            "ESCALATE" => BeatFunction::Escalate,
            "REVEAL" => BeatFunction::Reveal,
            "CRISIS" => BeatFunction::Crisis,
            "CLIMAX" => BeatFunction::Climax,
            "RESOLVE" => BeatFunction::Resolve,
            "COMPLICATE" => BeatFunction::Complicate,
            "BREATHE" => BeatFunction::Breathe,
            "PLANT" => BeatFunction::Plant,
            "PAYOFF" => BeatFunction::Payoff,
            _ => BeatFunction::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BeatFunction::Setup => "SETUP",
            BeatFunction::Incite => "INCITE",
            BeatFunction::Escalate => "ESCALATE",
            BeatFunction::Reveal => "REVEAL",
            BeatFunction::Crisis => "CRISIS",
            BeatFunction::Climax => "CLIMAX",
            BeatFunction::Resolve => "RESOLVE",
            BeatFunction::Complicate => "COMPLICATE",
            BeatFunction::Breathe => "BREATHE",
            BeatFunction::Plant => "PLANT",
            BeatFunction::Payoff => "PAYOFF",
            BeatFunction::Other(label) => label,
        }
    }

    /// Fixed structural position for beats that anchor the story arc.
    ///
    /// Floating beats (escalations, reveals, breathers...) can occur anywhere
    /// and return `None`.
    pub fn anchor_rank(&self) -> Option<u8> {
        match self {
            BeatFunction::Setup => Some(0),
            BeatFunction::Incite => Some(1),
            BeatFunction::Crisis => Some(2),
            BeatFunction::Climax => Some(3),
            BeatFunction::Resolve => Some(4),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BeatFunction::Other(label) if label.is_empty())
    }
}

impl From<String> for BeatFunction {
    fn from(value: String) -> Self {
        BeatFunction::parse(&value)
    }
}

impl From<BeatFunction> for String {
    fn from(value: BeatFunction) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for BeatFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship from one scene to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Connector {
    But,
    Therefore,
    AndThen,
    Meanwhile,
}

impl Connector {
    /// BUT and THEREFORE bind scenes causally; the rest are sequential
    pub fn is_causal(&self) -> bool {
        matches!(self, Connector::But | Connector::Therefore)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::But => "BUT",
            Connector::Therefore => "THEREFORE",
            Connector::AndThen => "AND_THEN",
            Connector::Meanwhile => "MEANWHILE",
        }
    }

    /// Parse a connector label, logging and discarding unknown ones
    pub fn parse_lenient(label: &str) -> Option<Self> {
        if label.trim().is_empty() {
            return None;
        }
        match label.parse() {
            Ok(connector) => Some(connector),
            Err(_) => {
                warn!("Ignoring unknown connector '{}'", label);
                None
            }
        }
    }
}

impl FromStr for Connector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "BUT" => Ok(Connector::But),
            "THEREFORE" => Ok(Connector::Therefore),
            "AND_THEN" | "ANDTHEN" => Ok(Connector::AndThen),
            "MEANWHILE" => Ok(Connector::Meanwhile),
            _ => Err(format!("Unknown connector '{}'", s)),
        }
    }
}

impl std::fmt::Display for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest and highest tension a scene can carry
pub const TENSION_RANGE: (u8, u8) = (1, 10);

/// Clamp a raw tension value into the 1..=10 scale
pub fn clamp_tension(raw: i64) -> u8 {
    raw.clamp(TENSION_RANGE.0 as i64, TENSION_RANGE.1 as i64) as u8
}

/// A scene as consumed by the diagnostics
///
/// Only `number`, `slug` and `summary` are always present. Annotation-free
/// scenes (parsed straight from a script) carry no function, connector or
/// tension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub number: u32,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<BeatFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
    #[serde(default, alias = "characters_present")]
    pub characters: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_tension",
        skip_serializing_if = "Option::is_none"
    )]
    pub tension: Option<u8>,
}

/// Accept any numeric tension and clamp it into [`TENSION_RANGE`]
fn deserialize_tension<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|t| clamp_tension(t.round() as i64)))
}

impl Scene {
    pub fn new(number: u32, slug: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            number,
            slug: slug.into(),
            summary: summary.into(),
            function: None,
            connector: None,
            characters: Vec::new(),
            tension: None,
        }
    }

    pub fn with_function(mut self, function: BeatFunction) -> Self {
        self.function = Some(function);
        self
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_characters<I, S>(mut self, characters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.characters = characters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tension(mut self, tension: i64) -> Self {
        self.tension = Some(clamp_tension(tension));
        self
    }

    /// The beat function, if present and non-empty
    pub fn beat(&self) -> Option<&BeatFunction> {
        self.function.as_ref().filter(|f| !f.is_empty())
    }
}

/// Derived link between two consecutive scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTransition {
    /// Scene number (not index) of the earlier scene
    pub from_scene: u32,
    /// Scene number (not index) of the later scene
    pub to_scene: u32,
    pub connector: Option<Connector>,
    pub is_causal: bool,
}

impl SceneTransition {
    pub fn between(from: &Scene, to: &Scene) -> Self {
        Self {
            from_scene: from.number,
            to_scene: to.number,
            connector: from.connector,
            is_causal: from.connector.is_some_and(|c| c.is_causal()),
        }
    }
}
