// OpenAI-compatible chat-completions adapter
// Also backs the OpenRouter, Groq and custom-endpoint providers, which share the wire format.

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, TokenUsage};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::new_with_api_base(api_key, OPENAI_API_BASE)
    }

    pub fn new_with_api_base(api_key: &str, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base.trim_end_matches('/'));
        Self {
            client: Client::with_config(config),
        }
    }
}

fn to_request_message(message: &LLMMessage) -> AppResult<ChatCompletionRequestMessage> {
    let converted: Result<ChatCompletionRequestMessage, OpenAIError> = match message.role.as_str() {
        "system" => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        "user" => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        other => {
            return Err(AppError::InvalidRequest(format!(
                "Unknown message role: {}",
                other
            )))
        }
    };
    converted.map_err(map_openai_error)
}

fn map_openai_error(err: OpenAIError) -> AppError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            AppError::Timeout(format!("chat completion: {}", e))
        }
        OpenAIError::ApiError(api) => AppError::LLMApi(format!(
            "API error: {} (type: {:?})",
            api.message, api.r#type
        )),
        other => AppError::LLMApi(other.to_string()),
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let system = request.system_instruction.as_ref().map(LLMMessage::system);
        let messages = system
            .iter()
            .chain(request.messages.iter())
            .map(to_request_message)
            .collect::<AppResult<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(request.model.as_str()).messages(messages);
        if let Some(max_tokens) = request.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        if request.json_mode {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let chat_request = builder.build().map_err(map_openai_error)?;

        debug!(model = %request.model, "Sending chat completion");

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLMApi("Provider returned no choices".to_string()))?;

        let finish_reason = choice
            .finish_reason
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "stop".to_string());

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason,
            usage,
        })
    }
}
