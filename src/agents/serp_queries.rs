//! SERP Query Agent
//!
//! Turns a research prompt into a short list of distinct search queries, each
//! with the research goal it serves. Later levels pass the learnings gathered
//! so far so the queries specialize instead of repeating earlier ground.

use super::ResearchModel;
use crate::research::{QueryGenerator, SubQuery};
use crate::types::AppResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SerpQueriesResponse {
    #[serde(default)]
    queries: Vec<SubQuery>,
}

pub struct SerpQueryAgent {
    model: ResearchModel,
}

impl SerpQueryAgent {
    pub fn new(model: ResearchModel) -> Self {
        Self { model }
    }

    fn create_prompt(query: &str, num_queries: usize, learnings: &[String]) -> String {
        let mut prompt = format!(
            "Given the following prompt from the user, generate a list of SERP queries to research the topic. \
             Return a maximum of {num_queries} queries, but feel free to return less if the original prompt is clear. \
             Make sure each query is unique and not similar to each other. \
             The prompt is: <prompt>{query}</prompt>"
        );

        if !learnings.is_empty() {
            prompt.push_str(&format!(
                "\n\nHere are some learnings from previous research, use them to generate more specific queries: {}",
                learnings.join("\n")
            ));
        }

        prompt
    }

    fn output_format(num_queries: usize) -> String {
        format!(
            r#"{{
  "queries": [
    {{
      "query": "The SERP query",
      "researchGoal": "First talk about the goal of the research that this query is meant to accomplish, then go deeper into how to advance the research once the results are found, mention additional research directions. Be as specific as possible, especially for additional research directions."
    }}
  ]
}}
List at most {num_queries} queries."#
        )
    }
}

#[async_trait]
impl QueryGenerator for SerpQueryAgent {
    async fn generate(
        &self,
        prompt: &str,
        max_count: usize,
        learnings: &[String],
    ) -> AppResult<Vec<SubQuery>> {
        let response: SerpQueriesResponse = self
            .model
            .generate_object(
                &Self::create_prompt(prompt, max_count, learnings),
                &Self::output_format(max_count),
            )
            .await?;

        let mut queries = response.queries;
        queries.retain(|q| !q.query.trim().is_empty());
        queries.truncate(max_count);

        info!(count = queries.len(), "Created SERP queries");
        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::scripted_model;

    #[test]
    fn test_prompt_includes_learnings_only_when_present() {
        let without = SerpQueryAgent::create_prompt("rust web frameworks", 3, &[]);
        assert!(without.contains("<prompt>rust web frameworks</prompt>"));
        assert!(without.contains("maximum of 3 queries"));
        assert!(!without.contains("learnings from previous research"));

        let with = SerpQueryAgent::create_prompt(
            "rust web frameworks",
            2,
            &["axum is built on hyper".to_string(), "actix uses actors".to_string()],
        );
        assert!(with.contains("axum is built on hyper\nactix uses actors"));
    }

    #[tokio::test]
    async fn test_generate_parses_and_truncates() {
        let (model, requests) = scripted_model(&[r#"```json
{"queries": [
  {"query": "axum vs actix benchmarks", "researchGoal": "Compare throughput"},
  {"query": "  ", "researchGoal": "blank query is dropped"},
  {"query": "axum middleware tower", "researchGoal": "Understand layering"},
  {"query": "rocket async support", "researchGoal": "Check maturity"}
]}
```"#]);
        let agent = SerpQueryAgent::new(model);

        let queries = agent.generate("rust web frameworks", 2, &[]).await.unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query, "axum vs actix benchmarks");
        assert_eq!(queries[0].research_goal, "Compare throughput");
        assert_eq!(queries[1].query, "axum middleware tower");
        assert!(requests.lock().unwrap()[0].messages[0]
            .content
            .contains("List at most 2 queries."));
    }

    #[tokio::test]
    async fn test_generate_propagates_llm_errors() {
        let (model, _) = scripted_model(&[]);
        let agent = SerpQueryAgent::new(model);
        assert!(agent.generate("topic", 3, &[]).await.is_err());
    }
}
