//! Scripted LLM adapter for agent tests.

use super::ResearchModel;
use crate::llm::provider::{LLMAdapter, LLM};
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub(crate) type RequestLog = Arc<Mutex<Vec<LLMRequest>>>;

/// Replies with the queued responses in order, then errors
pub(crate) struct ScriptedAdapter {
    responses: Mutex<VecDeque<String>>,
    requests: RequestLog,
}

#[async_trait]
impl LLMAdapter for ScriptedAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::LLMApi("no scripted response left".to_string()))?;

        Ok(LLMResponse {
            content,
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        })
    }
}

pub(crate) fn scripted_model(responses: &[&str]) -> (ResearchModel, RequestLog) {
    let requests: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let adapter = ScriptedAdapter {
        responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        requests: requests.clone(),
    };
    let llm = LLM::with_adapter("scripted", Box::new(adapter));
    (ResearchModel::new(Arc::new(llm), "test-model"), requests)
}
