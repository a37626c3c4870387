//! Learning Agent
//!
//! Distills the scraped contents of one SERP query into concise learnings and
//! follow-up questions for the next research level.

use super::ResearchModel;
use crate::research::{Summarizer, Summary};
use crate::types::AppResult;
use crate::utils::{trim_prompt, CONTEXT_CHAR_BUDGET};
use async_trait::async_trait;
use tracing::info;

pub struct LearningAgent {
    model: ResearchModel,
}

impl LearningAgent {
    pub fn new(model: ResearchModel) -> Self {
        Self { model }
    }

    fn create_prompt(query: &str, contents: &[String], num_learnings: usize) -> String {
        let contents_block = contents
            .iter()
            .map(|content| format!("<content>\n{}\n</content>", content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Given the following contents from a SERP search for the query <query>{query}</query>, generate a list of learnings from the contents. \
             Return a maximum of {num_learnings} learnings, but feel free to return less if the contents are clear. \
             Make sure each learning is unique and not similar to each other. \
             The learnings should be concise and to the point, as detailed and information dense as possible. \
             Make sure to include any entities like people, places, companies, products, things, etc in the learnings, as well as any exact metrics, numbers, or dates. \
             The learnings will be used to research the topic further.\n\n<contents>{contents_block}</contents>"
        );

        trim_prompt(&prompt, CONTEXT_CHAR_BUDGET).to_string()
    }

    fn output_format(num_learnings: usize, num_follow_ups: usize) -> String {
        format!(
            r#"{{
  "learnings": ["List of learnings, max of {num_learnings}"],
  "followUpQuestions": ["List of follow-up questions to research the topic further, max of {num_follow_ups}"]
}}"#
        )
    }
}

#[async_trait]
impl Summarizer for LearningAgent {
    async fn summarize(
        &self,
        query: &str,
        contents: &[String],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> AppResult<Summary> {
        info!(query = %query, contents = contents.len(), "Extracting learnings");

        let mut summary: Summary = self
            .model
            .generate_object(
                &Self::create_prompt(query, contents, max_learnings),
                &Self::output_format(max_learnings, max_follow_ups),
            )
            .await?;

        summary.learnings.truncate(max_learnings);
        summary.follow_up_questions.truncate(max_follow_ups);

        info!(
            query = %query,
            learnings = summary.learnings.len(),
            follow_ups = summary.follow_up_questions.len(),
            "Created learnings"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::scripted_model;

    #[test]
    fn test_prompt_wraps_each_content() {
        let prompt = LearningAgent::create_prompt(
            "tokio runtime",
            &["first page".to_string(), "second page".to_string()],
            3,
        );
        assert!(prompt.contains("<query>tokio runtime</query>"));
        assert!(prompt.contains("<contents><content>\nfirst page\n</content>\n<content>\nsecond page\n</content></contents>"));
        assert!(prompt.contains("maximum of 3 learnings"));
    }

    #[tokio::test]
    async fn test_summarize_caps_counts() {
        let (model, _) = scripted_model(&[r#"{
            "learnings": ["one", "two", "three", "four"],
            "followUpQuestions": ["a?", "b?", "c?"]
        }"#]);
        let agent = LearningAgent::new(model);

        let summary = agent
            .summarize("tokio runtime", &["page".to_string()], 3, 2)
            .await
            .unwrap();

        assert_eq!(summary.learnings, vec!["one", "two", "three"]);
        assert_eq!(summary.follow_up_questions, vec!["a?", "b?"]);
    }

    #[tokio::test]
    async fn test_summarize_rejects_malformed_output() {
        let (model, _) = scripted_model(&["I could not find anything useful."]);
        let agent = LearningAgent::new(model);
        assert!(agent.summarize("q", &[], 3, 2).await.is_err());
    }
}
