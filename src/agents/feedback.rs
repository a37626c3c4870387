//! Feedback Agent
//!
//! Asks clarifying questions about the user's query before research starts.

use super::ResearchModel;
use crate::types::AppResult;
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_FEEDBACK_QUESTIONS: usize = 3;

#[derive(Debug, Deserialize)]
struct FeedbackResponse {
    #[serde(default)]
    questions: Vec<String>,
}

pub struct FeedbackAgent {
    model: ResearchModel,
}

impl FeedbackAgent {
    pub fn new(model: ResearchModel) -> Self {
        Self { model }
    }

    /// Up to `num_questions` follow-up questions clarifying the research direction
    pub async fn generate_feedback(&self, query: &str, num_questions: usize) -> AppResult<Vec<String>> {
        let prompt = format!(
            "Given the following query from the user, ask some follow up questions to clarify the research direction. \
             Return a maximum of {num_questions} questions, but feel free to return less if the original query is clear: <query>{query}</query>"
        );
        let output_format = format!(
            r#"{{"questions": ["Follow up questions to clarify the research direction, max of {num_questions}"]}}"#
        );

        let response: FeedbackResponse = self.model.generate_object(&prompt, &output_format).await?;
        let questions: Vec<String> = response
            .questions
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .take(num_questions)
            .collect();

        info!(count = questions.len(), "Generated feedback questions");
        Ok(questions)
    }
}

/// Fold the user's answers into the prompt handed to the research engine
pub fn combine_query(initial_query: &str, questions: &[String], answers: &[String]) -> String {
    if questions.is_empty() {
        return initial_query.to_string();
    }

    let qa = questions
        .iter()
        .zip(answers.iter().map(String::as_str).chain(std::iter::repeat("")))
        .map(|(question, answer)| format!("Q: {}\nA: {}", question, answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Initial Query: {}\nFollow-up Questions and Answers:\n{}",
        initial_query, qa
    )
}
