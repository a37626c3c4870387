//! Report Agent
//!
//! Turns the learnings of a finished run into either a long-form markdown
//! report (with a sources section) or a terse exact answer.

use super::ResearchModel;
use crate::types::{AppError, AppResult};
use crate::utils::{trim_prompt, CONTEXT_CHAR_BUDGET};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Output format of a research run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Detailed markdown report
    #[default]
    Report,
    /// Short answer in the format the prompt asks for
    Answer,
}

impl std::str::FromStr for ReportMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "report" => Ok(ReportMode::Report),
            "answer" => Ok(ReportMode::Answer),
            other => Err(AppError::InvalidRequest(format!("Unknown report mode: {}", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    report_markdown: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerResponse {
    exact_answer: String,
}

pub struct ReportAgent {
    model: ResearchModel,
}

impl ReportAgent {
    pub fn new(model: ResearchModel) -> Self {
        Self { model }
    }

    /// Write the output for `mode`
    pub async fn write(
        &self,
        mode: ReportMode,
        prompt: &str,
        learnings: &[String],
        visited_urls: &[String],
    ) -> AppResult<String> {
        match mode {
            ReportMode::Report => self.write_final_report(prompt, learnings, visited_urls).await,
            ReportMode::Answer => self.write_final_answer(prompt, learnings).await,
        }
    }

    pub async fn write_final_report(
        &self,
        prompt: &str,
        learnings: &[String],
        visited_urls: &[String],
    ) -> AppResult<String> {
        info!(learnings = learnings.len(), urls = visited_urls.len(), "Writing final report");

        let request = trim_prompt(
            &format!(
                "Given the following prompt from the user, write a final report on the topic using the learnings from research. \
                 Make it as detailed as possible, aim for 3 or more pages, include ALL the learnings from research:\n\n\
                 <prompt>{}</prompt>\n\nHere are all the learnings from previous research:\n\n<learnings>\n{}\n</learnings>",
                prompt,
                format_learnings(learnings)
            ),
            CONTEXT_CHAR_BUDGET,
        )
        .to_string();

        let response: ReportResponse = self
            .model
            .generate_object(
                &request,
                r#"{"reportMarkdown": "Final report on the topic in Markdown"}"#,
            )
            .await?;

        Ok(format!("{}{}", response.report_markdown, sources_section(visited_urls)))
    }

    pub async fn write_final_answer(&self, prompt: &str, learnings: &[String]) -> AppResult<String> {
        info!(learnings = learnings.len(), "Writing final answer");

        let request = trim_prompt(
            &format!(
                "Given the following prompt from the user, write a final answer on the topic using the learnings from research. \
                 Follow the format specified in the prompt. Do not yap or babble or include any other text than the answer besides the format specified in the prompt. \
                 Keep the answer as concise as possible - usually it should be just a few words or maximum a sentence. \
                 Try to follow the format specified in the prompt (for example, if the prompt is using Latex, the answer should be in Latex. \
                 If the prompt gives multiple answer choices, the answer should be one of the choices).\n\n\
                 <prompt>{}</prompt>\n\nHere are all the learnings from research on the topic that you can use to help answer the prompt:\n\n<learnings>\n{}\n</learnings>",
                prompt,
                format_learnings(learnings)
            ),
            CONTEXT_CHAR_BUDGET,
        )
        .to_string();

        let response: AnswerResponse = self
            .model
            .generate_object(
                &request,
                r#"{"exactAnswer": "The final answer, make it short and concise, just the answer, no other text"}"#,
            )
            .await?;

        Ok(response.exact_answer.trim().to_string())
    }
}

fn format_learnings(learnings: &[String]) -> String {
    learnings
        .iter()
        .map(|learning| format!("<learning>\n{}\n</learning>", learning))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown list of visited URLs appended to every report
pub fn sources_section(visited_urls: &[String]) -> String {
    let urls = visited_urls
        .iter()
        .map(|url| format!("- {}", url))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n## Sources\n\n{}", urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::scripted_model;

    #[test]
    fn test_sources_section() {
        let section = sources_section(&[
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ]);
        assert_eq!(section, "\n\n## Sources\n\n- https://a.example\n- https://b.example");
    }

    #[test]
    fn test_report_mode_parsing() {
        assert_eq!("Answer".parse::<ReportMode>().unwrap(), ReportMode::Answer);
        assert_eq!("report".parse::<ReportMode>().unwrap(), ReportMode::Report);
        assert!("summary".parse::<ReportMode>().is_err());
    }

    #[tokio::test]
    async fn test_final_report_appends_sources() {
        let (model, requests) = scripted_model(&[r##"{"reportMarkdown": "# Findings\n\nBody"}"##]);
        let agent = ReportAgent::new(model);

        let report = agent
            .write_final_report(
                "EV batteries",
                &["LFP cells dominate".to_string()],
                &["https://example.com/lfp".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(report, "# Findings\n\nBody\n\n## Sources\n\n- https://example.com/lfp");
        let sent = &requests.lock().unwrap()[0].messages[0].content;
        assert!(sent.contains("<learning>\nLFP cells dominate\n</learning>"));
    }

    #[tokio::test]
    async fn test_final_answer_is_trimmed() {
        let (model, _) = scripted_model(&[r#"{"exactAnswer": "  42 \n"}"#]);
        let agent = ReportAgent::new(model);

        let answer = agent
            .write(ReportMode::Answer, "What is the answer?", &[], &[])
            .await
            .unwrap();

        assert_eq!(answer, "42");
    }
}
