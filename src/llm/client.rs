//! HTTP-backed LLM provider supporting Anthropic, OpenAI and Ollama
//!
//! Uses ureq (sync HTTP), so no async runtime is needed. Ollama is spoken to
//! through its OpenAI-compatible endpoint.

use super::{Completion, LlmError, LlmProvider, LlmResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Supported HTTP backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Ollama,
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::Ollama => "ollama",
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::OpenAi => "openai",
        }
    }

    pub fn env_key(&self) -> Option<&'static str> {
        match self {
            LlmBackend::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmBackend::OpenAi => Some("OPENAI_API_KEY"),
            LlmBackend::Ollama => None,
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::Ollama => "llama3.2",
        }
    }

    /// Base URL the chat endpoint hangs off
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1",
            LlmBackend::OpenAi => "https://api.openai.com/v1",
            LlmBackend::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn is_openai_compatible(&self) -> bool {
        matches!(self, LlmBackend::OpenAi | LlmBackend::Ollama)
    }
}

/// Append `/v1` to an Ollama host unless already present
pub(crate) fn normalize_ollama_url(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

/// Provider that calls a hosted or local chat-completion API
pub struct HttpProvider {
    backend: LlmBackend,
    model: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to LlmError below
        .timeout_global(Some(std::time::Duration::from_secs(120)))
        .build()
        .new_agent()
}

impl HttpProvider {
    pub fn new(
        backend: LlmBackend,
        model: Option<String>,
        base_url: Option<String>,
        api_key: Option<String>,
    ) -> LlmResult<Self> {
        if let Some(env_var) = backend.env_key() {
            if api_key.as_deref().map_or(true, str::is_empty) {
                return Err(LlmError::MissingApiKey {
                    env_var: env_var.to_string(),
                    signup_url: backend.signup_url().to_string(),
                });
            }
        }

        let base_url = match (backend, base_url) {
            (LlmBackend::Ollama, Some(url)) => normalize_ollama_url(&url),
            // Anthropic has no compatible third-party endpoints to point at
            (LlmBackend::Anthropic, _) | (_, None) => backend.default_base_url().to_string(),
            (_, Some(url)) => url.trim_end_matches('/').to_string(),
        };

        Ok(Self {
            backend,
            model: model.unwrap_or_else(|| backend.default_model().to_string()),
            base_url,
            api_key,
            max_tokens: 4096,
            agent: make_agent(),
        })
    }

    pub fn backend(&self) -> LlmBackend {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn complete_openai(&self, prompt: &str, system: Option<&str>) -> LlmResult<Completion> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(Message::system(sys));
        }
        messages.push(Message::user(prompt));

        let body = OpenAiRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", &format!("Bearer {}", key));
        }

        let response = req
            .send_json(&body)
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: OpenAiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let mut usage = HashMap::new();
        if let Some(u) = resp.usage {
            usage.insert("input_tokens".to_string(), u.prompt_tokens);
            usage.insert("output_tokens".to_string(), u.completion_tokens);
        }

        let content = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::ParseError("No response choices".to_string()))?;

        Ok(Completion {
            content,
            model: resp.model.unwrap_or_else(|| self.model.clone()),
            usage,
        })
    }

    fn complete_anthropic(&self, prompt: &str, system: Option<&str>) -> LlmResult<Completion> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message::user(prompt)],
            system: system.map(|s| s.to_string()),
        };

        let url = format!("{}/messages", self.base_url);
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", "2023-06-01")
            .send_json(&body)
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: AnthropicResponse = response
            .into_body()
            .read_json()
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let mut usage = HashMap::new();
        if let Some(u) = resp.usage {
            usage.insert("input_tokens".to_string(), u.input_tokens);
            usage.insert("output_tokens".to_string(), u.output_tokens);
        }

        let content = resp
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))?;

        Ok(Completion {
            content,
            model: resp.model.unwrap_or_else(|| self.model.clone()),
            usage,
        })
    }
}

impl LlmProvider for HttpProvider {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<Completion> {
        debug!(
            "Calling {} ({}) with a {}-char prompt",
            self.backend.name(),
            self.model,
            prompt.len()
        );
        if self.backend.is_openai_compatible() {
            self.complete_openai(prompt, system)
        } else {
            self.complete_anthropic(prompt, system)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

impl Message {
    fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_string(),
        }
    }

    fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }
}

// OpenAI-compatible API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
