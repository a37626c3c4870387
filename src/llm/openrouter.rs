// OpenRouter speaks the OpenAI chat-completions format

use crate::llm::provider::LLMAdapter;
use crate::types::{AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterAdapter {
    inner: crate::llm::openai::OpenAIAdapter,
}

impl OpenRouterAdapter {
    pub fn new(api_key: &str) -> Self {
        Self {
            inner: crate::llm::openai::OpenAIAdapter::new_with_api_base(api_key, OPENROUTER_API_BASE),
        }
    }
}

#[async_trait]
impl LLMAdapter for OpenRouterAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(request).await
    }
}
