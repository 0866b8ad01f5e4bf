//! Provider selection from CLI flags and user configuration

use super::{HttpProvider, LlmBackend, LlmError, LlmProvider, LlmResult, MockProvider};
use crate::config::UserConfig;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Which provider to use for LLM-backed diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Ollama,
    Anthropic,
    OpenAi,
    Mock,
    /// Run without an LLM; LLM-backed diagnostics report INFO notes instead
    None,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
            ProviderKind::None => "none",
        }
    }

    fn backend(&self) -> Option<LlmBackend> {
        match self {
            ProviderKind::Ollama => Some(LlmBackend::Ollama),
            ProviderKind::Anthropic => Some(LlmBackend::Anthropic),
            ProviderKind::OpenAi => Some(LlmBackend::OpenAi),
            ProviderKind::Mock | ProviderKind::None => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            "none" | "off" => Ok(ProviderKind::None),
            _ => Err(LlmError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the provider for `kind`
///
/// Explicit `model`/`base_url` win over the `[llm]` config section. Returns
/// `Ok(None)` for [`ProviderKind::None`]; fails when a hosted backend has no
/// API key.
pub fn build_provider(
    kind: ProviderKind,
    model: Option<String>,
    base_url: Option<String>,
    config: &UserConfig,
) -> LlmResult<Option<Arc<dyn LlmProvider>>> {
    let Some(backend) = kind.backend() else {
        if kind == ProviderKind::Mock {
            let mock: Arc<dyn LlmProvider> =
                Arc::new(MockProvider::with_default_response("Mock response from CLI"));
            return Ok(Some(mock));
        }
        return Ok(None);
    };

    let model = model.or_else(|| config.llm.model.clone());
    let base_url = base_url.or_else(|| match backend {
        LlmBackend::Ollama => config
            .llm
            .base_url
            .clone()
            .or_else(|| config.ollama_host().map(str::to_string)),
        _ => config.llm.base_url.clone(),
    });
    let api_key = match backend {
        LlmBackend::Anthropic => config.anthropic_api_key().map(str::to_string),
        LlmBackend::OpenAi => config.openai_api_key().map(str::to_string),
        LlmBackend::Ollama => None,
    };

    let provider = HttpProvider::new(backend, model, base_url, api_key)?;
    info!(
        "Using {} provider (model {}, endpoint {})",
        kind,
        provider.model(),
        provider.base_url()
    );
    let provider: Arc<dyn LlmProvider> = Arc::new(provider);
    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_kind() {
        assert_eq!("OLLAMA".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("none".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(LlmError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_none_builds_no_provider() {
        let provider = build_provider(ProviderKind::None, None, None, &UserConfig::default()).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn test_mock_builds_mock() {
        let provider = build_provider(ProviderKind::Mock, None, None, &UserConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_anthropic_without_key_fails() {
        let err = build_provider(ProviderKind::Anthropic, None, None, &UserConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::MissingApiKey { .. }));
    }

    #[test]
    fn test_config_key_and_model_are_used() {
        let mut config = UserConfig::default();
        config.llm.openai_api_key = Some("sk-config".into());
        config.llm.model = Some("gpt-4o-mini".into());
        let provider = build_provider(ProviderKind::OpenAi, None, None, &config)
            .unwrap()
            .unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
