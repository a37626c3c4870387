//! Agent System
//!
//! LLM-backed collaborators around the research engine:
//!
//! - **Feedback Agent**: asks clarifying questions before a run
//! - **SERP Query Agent**: turns a research prompt into search queries
//! - **Learning Agent**: distills scraped pages into learnings and follow-ups
//! - **Report Agent**: writes the final report or exact answer
//!
//! ## Pipeline Overview
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Feedback   │  → Clarifying questions (optional)
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │    Deep     │  → SERP queries, search, learnings (recursive)
//! │  Research   │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Report    │  → Markdown report or exact answer
//! │   Agent     │
//! └─────────────┘
//! ```

pub mod feedback;
pub mod learnings;
pub mod report;
pub mod serp_queries;

#[cfg(test)]
pub(crate) mod testing;

pub use feedback::{combine_query, FeedbackAgent, DEFAULT_FEEDBACK_QUESTIONS};
pub use learnings::LearningAgent;
pub use report::{ReportAgent, ReportMode};
pub use serp_queries::SerpQueryAgent;

use crate::config::Config;
use crate::llm::provider::LLM;
use crate::research::{DeepResearcher, EngineSettings};
use crate::search::{FirecrawlClient, SearchProvider};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use crate::utils::system_prompt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// A configured model shared by every agent
#[derive(Clone)]
pub struct ResearchModel {
    llm: Arc<LLM>,
    model: String,
}

impl ResearchModel {
    pub fn new(llm: Arc<LLM>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a JSON object matching `output_format` and decode it
    pub async fn generate_object<T: DeserializeOwned>(
        &self,
        prompt: &str,
        output_format: &str,
    ) -> AppResult<T> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(format!(
                "{}\n\nOUTPUT FORMAT (respond with ONLY valid JSON):\n{}",
                prompt, output_format
            ))],
            max_tokens: None,
            temperature: None,
            system_instruction: Some(system_prompt()),
            json_mode: true,
        };

        let response = self.llm.create_chat_completion(&request).await?;
        debug!(
            provider = self.llm.provider_name(),
            response_len = response.content.len(),
            total_tokens = response.usage.total_tokens,
            "Received structured response"
        );

        parse_json_response(&response.content).inspect_err(|e| {
            warn!(error = %e, "Model returned unparseable JSON");
        })
    }
}

/// Parse a JSON object out of a model response, tolerating ``` fences
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> AppResult<T> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response).trim()
    } else {
        response.trim()
    };

    serde_json::from_str(json_str).map_err(|e| AppError::Parse(e.to_string()))
}

/// Everything a research run needs, wired from configuration
pub struct ResearchPipeline {
    pub researcher: Arc<DeepResearcher>,
    pub feedback: Arc<FeedbackAgent>,
    pub reports: Arc<ReportAgent>,
}

impl ResearchPipeline {
    pub fn new(
        model: ResearchModel,
        search: Arc<dyn SearchProvider>,
        settings: EngineSettings,
    ) -> Self {
        let researcher = DeepResearcher::new(
            Arc::new(SerpQueryAgent::new(model.clone())),
            search,
            Arc::new(LearningAgent::new(model.clone())),
            settings,
        );

        Self {
            researcher: Arc::new(researcher),
            feedback: Arc::new(FeedbackAgent::new(model.clone())),
            reports: Arc::new(ReportAgent::new(model)),
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let llm = Arc::new(LLM::from_config(&config.llm)?);
        let model = ResearchModel::new(llm, config.llm.model.clone());
        let search = FirecrawlClient::from_config(&config.search)
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self::new(
            model,
            Arc::new(search),
            EngineSettings::from(&config.research),
        ))
    }
}
