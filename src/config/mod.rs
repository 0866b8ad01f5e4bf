//! Configuration module for narratological
//!
//! This module handles:
//! - LLM provider settings and API keys
//! - Health threshold overrides
//! - The compendium location

mod user_config;

pub use user_config::{LlmSettings, UserConfig, PROJECT_CONFIG_FILE};
pub(crate) use user_config::write_example_config;
