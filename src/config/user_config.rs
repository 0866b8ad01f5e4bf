//! User-level configuration for narratological
//!
//! Supports loading config from:
//! - ~/.config/narratological/config.toml
//! - ./narratological.toml (project file, overrides the user file)
//! - Environment variables (override both files)

use crate::diagnostics::DiagnosticThresholds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the per-project config
pub const PROJECT_CONFIG_FILE: &str = "narratological.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub thresholds: DiagnosticThresholds,

    /// Path to the compendium JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compendium: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LlmSettings {
    /// Provider: "ollama" (default), "anthropic", "openai", "mock", "none"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Custom endpoint for OpenAI-compatible servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Ollama host (default: http://localhost:11434)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. Project config (./narratological.toml)
    /// 3. User config (~/.config/narratological/config.toml)
    pub fn load() -> Result<Self> {
        let mut files = Vec::new();
        if let Some(path) = Self::user_config_path() {
            files.push(path);
        }
        files.push(PathBuf::from(PROJECT_CONFIG_FILE));

        let mut config = Self::load_from_files(&files)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge the given TOML files in order (later files win) on top of the
    /// defaults. Missing files are skipped; invalid ones are logged and
    /// skipped.
    pub fn load_from_files(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in paths {
            if let Some(table) = read_table(path) {
                debug!("Merging config from {}", path.display());
                merge_tables(&mut merged, table);
            }
        }
        let config: UserConfig = toml::Value::Table(merged)
            .try_into()
            .context("Config values have the wrong types")?;
        Ok(config)
    }

    /// Apply environment overrides, looking variables up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.llm.anthropic_api_key = Some(key);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.llm.ollama_host = Some(host);
        }
        if let Some(provider) = non_empty("NARRATOLOGICAL_PROVIDER") {
            self.llm.provider = Some(provider);
        }
        if let Some(path) = non_empty("NARRATOLOGICAL_COMPENDIUM") {
            self.compendium = Some(PathBuf::from(path));
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("narratological").join("config.toml"))
    }

    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.llm.anthropic_api_key.as_deref()
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.llm.openai_api_key.as_deref()
    }

    pub fn ollama_host(&self) -> Option<&str> {
        self.llm.ollama_host.as_deref()
    }

    /// Configured provider name, `ollama` when unset
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or("ollama")
    }

    /// Copy with API keys masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.anthropic_api_key = copy.llm.anthropic_api_key.as_deref().map(mask_secret);
        copy.llm.openai_api_key = copy.llm.openai_api_key.as_deref().map(mask_secret);
        copy
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        write_example_config(&config_path)?;
        Ok(config_path)
    }
}

const EXAMPLE_CONFIG: &str = r#"# Narratological configuration

# Path to the studies compendium JSON
# compendium = "data/narratological-algorithms-unified.json"

[llm]
# Provider: "ollama" (local, no key), "anthropic", "openai", "mock", "none"
# provider = "ollama"
# model = "llama3.2"

# OpenAI-compatible endpoint (LiteLLM, vLLM, LocalAI...)
# base_url = "http://localhost:4000/v1"
# ollama_host = "http://localhost:11434"

# anthropic_api_key = "sk-ant-..."
# openai_api_key = "sk-..."

[thresholds]
# Any subset of the health cut-points; unset values keep their defaults
# causal_binding_excellent = 0.90
# causal_binding_good = 0.80
# reorderability_excellent = 0.15
# necessity_good = 0.70
"#;

/// Write the commented example config to `path` unless it already exists
pub(crate) fn write_example_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn read_table(path: &Path) -> Option<toml::Table> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match content.parse::<toml::Table>() {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("Ignoring invalid config {}: {}", path.display(), e);
            None
        }
    }
}

/// Deep-merge `overlay` into `base`; nested tables merge, other values replace
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let incoming = match value {
            toml::Value::Table(incoming) => incoming,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{visible}...")
}
