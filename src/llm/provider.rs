use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for LLM provider (renamed to avoid conflict with LLMProvider enum in types.rs)
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    /// Overrides the provider's default base URL (OpenAI-compatible endpoints)
    pub api_base: Option<String>,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match (provider.provider, provider.api_base.as_deref()) {
            (LLMProvider::OpenAI, None) => {
                Box::new(crate::llm::openai::OpenAIAdapter::new(&provider.api_key))
            }
            // Self-hosted or proxy endpoints speaking the OpenAI wire format
            (LLMProvider::OpenAI | LLMProvider::Custom, Some(base)) => Box::new(
                crate::llm::openai::OpenAIAdapter::new_with_api_base(&provider.api_key, base),
            ),
            (LLMProvider::Custom, None) => {
                return Err(AppError::Config(
                    "Custom LLM provider requires OPENAI_ENDPOINT".to_string(),
                ))
            }
            (LLMProvider::OpenRouter, _) => {
                Box::new(crate::llm::openrouter::OpenRouterAdapter::new(&provider.api_key))
            }
            (LLMProvider::Groq, _) => Box::new(crate::llm::groq::GroqAdapter::new(&provider.api_key)),
        };

        Ok(Self {
            adapter,
            provider_name: provider.provider.to_string(),
        })
    }

    /// Build the client for the provider selected in configuration
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let api_key = config.active_api_key().ok_or_else(|| {
            AppError::Config(format!("No API key configured for provider {}", config.provider))
        })?;

        Self::new(LLMProviderConfig {
            provider: config.provider,
            api_key,
            api_base: config.openai_endpoint.clone(),
        })
    }

    /// Wrap an existing adapter (used by tests and embedders)
    pub fn with_adapter(name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_provider_needs_endpoint() {
        let result = LLM::new(LLMProviderConfig {
            provider: LLMProvider::Custom,
            api_key: "key".to_string(),
            api_base: None,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LLMConfig {
            provider: LLMProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            openai_api_key: String::new(),
            openai_endpoint: None,
            openrouter_api_key: String::new(),
            groq_api_key: String::new(),
        };
        assert!(LLM::from_config(&config).is_err());
    }

    #[test]
    fn test_provider_name() {
        let llm = LLM::new(LLMProviderConfig {
            provider: LLMProvider::Groq,
            api_key: "gsk".to_string(),
            api_base: None,
        })
        .unwrap();
        assert_eq!(llm.provider_name(), "groq");
    }
}
