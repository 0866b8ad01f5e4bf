//! LLM provider interface
//!
//! Diagnostics that need judgement beyond structure (information economy,
//! framework alignment) talk to a language model through the [`LlmProvider`]
//! trait. Concrete providers:
//!
//! - [`HttpProvider`]: Anthropic, OpenAI or Ollama over sync HTTP (ureq)
//! - [`MockProvider`]: canned responses for tests, no network
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OLLAMA_HOST`: Ollama server URL (default: http://localhost:11434)

mod client;
mod mock;
mod provider_config;
mod schema;

pub use client::{HttpProvider, LlmBackend};
pub use mock::{MockCall, MockProvider, MockResponse};
pub use provider_config::{build_provider, ProviderKind};
pub use schema::{ResponseSchema, StructuredResponse};

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while talking to an LLM
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Response does not match schema '{schema}': {message}")]
    SchemaMismatch { schema: String, message: String },

    #[error("Unknown provider '{0}'. Available: ollama, anthropic, openai, mock, none")]
    UnknownProvider(String),

    #[error("Mock provider error: {0}")]
    Mock(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Text returned by a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub model: String,
    /// Token counts keyed `input_tokens` / `output_tokens` when reported
    pub usage: HashMap<String, u64>,
}

/// A language-model backend
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs and reports
    fn name(&self) -> &str;

    /// Generate a free-text completion
    fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<Completion>;

    /// Generate a completion and parse it as JSON shaped by `schema`
    ///
    /// The default appends the JSON schema to the prompt, strips any
    /// markdown code fence around the answer and parses it.
    fn complete_json(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
        system: Option<&str>,
    ) -> LlmResult<serde_json::Value> {
        let schema_json = serde_json::to_string_pretty(schema.to_json_schema())
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        let structured_prompt = format!(
            "{prompt}\n\nRespond with valid JSON matching this schema:\n{schema_json}\n\n\
             Return ONLY the JSON object, no additional text or markdown code blocks."
        );
        let completion = self.complete(&structured_prompt, system)?;
        parse_json_content(&completion.content)
    }
}

/// Request a structured answer and deserialize it into `T`
///
/// Content that is not JSON, misses a required field, or has a field of the
/// wrong type is an error; callers never see a half-filled `T`.
pub fn complete_structured<T: StructuredResponse>(
    provider: &dyn LlmProvider,
    prompt: &str,
    system: Option<&str>,
) -> LlmResult<T> {
    let schema = T::schema();
    let value = provider.complete_json(prompt, &schema, system)?;
    schema
        .validate(&value)
        .map_err(|message| LlmError::SchemaMismatch {
            schema: schema.name.clone(),
            message,
        })?;
    debug!("{} returned a valid '{}' response", provider.name(), schema.name);
    serde_json::from_value(value).map_err(|e| LlmError::SchemaMismatch {
        schema: schema.name.clone(),
        message: e.to_string(),
    })
}

/// Parse model output as JSON, tolerating a surrounding ``` fence
pub(crate) fn parse_json_content(content: &str) -> LlmResult<serde_json::Value> {
    let stripped = strip_code_fence(content);
    serde_json::from_str(stripped).map_err(|e| LlmError::ParseError(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    // Drop the opening fence and its language tag, then the closing fence
    let after_fence = &trimmed[3..];
    let body = match after_fence.find('\n') {
        Some(idx) => &after_fence[idx + 1..],
        None => after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
