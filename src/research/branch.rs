//! Branch execution: search → summarize → recurse or stop.

use super::{
    ConcurrencyGate, DeepResearcher, ProgressTracker, ProgressUpdate, ResearchResult,
    ResearchTask, SubQuery,
};
use crate::search::{ContentFormat, SearchError, SearchOptions};
use crate::types::AppError;
use crate::utils::trim_prompt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStage {
    Search,
    Summarize,
}

impl std::fmt::Display for BranchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchStage::Search => write!(f, "search"),
            BranchStage::Summarize => write!(f, "summarize"),
        }
    }
}

/// Why a branch was pruned. Never leaves the orchestrator.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error("{stage} timed out after {limit:?}")]
    Timeout { stage: BranchStage, limit: Duration },

    #[error("search failed: {0}")]
    Search(#[source] SearchError),

    #[error("summarization failed: {0}")]
    Summarize(#[source] AppError),

    #[error("concurrency gate closed")]
    GateClosed(#[from] AcquireError),
}

impl BranchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BranchError::Timeout { .. })
    }

    fn from_search(err: SearchError, limit: Duration) -> Self {
        match err {
            SearchError::Timeout(_) => BranchError::Timeout {
                stage: BranchStage::Search,
                limit,
            },
            other => BranchError::Search(other),
        }
    }

    fn from_summarize(err: AppError, limit: Duration) -> Self {
        match err {
            AppError::Timeout(_) => BranchError::Timeout {
                stage: BranchStage::Summarize,
                limit,
            },
            other => BranchError::Summarize(other),
        }
    }
}

/// Prompt for the child level: the parent's goal plus the new directions
pub fn compose_next_query(research_goal: &str, follow_up_questions: &[String]) -> String {
    let directions: String = follow_up_questions
        .iter()
        .map(|question| format!("\n{}", question))
        .collect();

    format!(
        "Previous research goal: {}\nFollow-up research directions: {}",
        research_goal, directions
    )
    .trim()
    .to_string()
}

impl DeepResearcher {
    /// Run one branch behind `gate`. Failures are logged and become an empty result.
    pub(crate) async fn run_gated_branch(
        &self,
        gate: &ConcurrencyGate,
        sub_query: &SubQuery,
        task: &ResearchTask,
        progress: &ProgressTracker,
    ) -> ResearchResult {
        let outcome = match gate.enter().await {
            Ok(_permit) => self.run_branch(sub_query, task, progress).await,
            Err(e) => Err(BranchError::from(e)),
        };

        match outcome {
            Ok(result) => result,
            Err(e) if e.is_timeout() => {
                warn!(query = %sub_query.query, error = %e, "Timeout running query, pruning branch");
                ResearchResult::default()
            }
            Err(e) => {
                error!(query = %sub_query.query, error = %e, "Error running query, pruning branch");
                ResearchResult::default()
            }
        }
    }

    pub(crate) async fn run_branch(
        &self,
        sub_query: &SubQuery,
        task: &ResearchTask,
        progress: &ProgressTracker,
    ) -> Result<ResearchResult, BranchError> {
        let settings = self.settings();
        let options = SearchOptions {
            timeout: settings.search_timeout,
            max_results: settings.max_search_results,
            format: ContentFormat::Markdown,
        };

        let documents = timeout(
            settings.search_timeout,
            self.search_provider().search(&sub_query.query, &options),
        )
        .await
        .map_err(|_| BranchError::Timeout {
            stage: BranchStage::Search,
            limit: settings.search_timeout,
        })?
        .map_err(|e| BranchError::from_search(e, settings.search_timeout))?;

        let new_urls: Vec<String> = documents
            .iter()
            .filter_map(|doc| doc.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();

        let contents: Vec<String> = documents
            .iter()
            .filter_map(|doc| doc.content.as_deref())
            .filter(|content| !content.trim().is_empty())
            .map(|content| trim_prompt(content, settings.max_document_chars).to_string())
            .collect();

        info!(query = %sub_query.query, contents = contents.len(), urls = new_urls.len(), "Ran query");

        let new_breadth = task.next_breadth();
        let new_depth = task.next_depth();

        let summary = timeout(
            settings.summarize_timeout,
            self.summarizer().summarize(
                &sub_query.query,
                &contents,
                settings.learnings_per_branch,
                new_breadth,
            ),
        )
        .await
        .map_err(|_| BranchError::Timeout {
            stage: BranchStage::Summarize,
            limit: settings.summarize_timeout,
        })?
        .map_err(|e| BranchError::from_summarize(e, settings.summarize_timeout))?;

        debug!(
            query = %sub_query.query,
            learnings = summary.learnings.len(),
            follow_ups = summary.follow_up_questions.len(),
            "Summarized results"
        );

        let mut learnings = task.learnings.clone();
        learnings.extend(
            summary
                .learnings
                .into_iter()
                .take(settings.learnings_per_branch),
        );
        let mut visited_urls = task.visited_urls.clone();
        visited_urls.extend(new_urls);

        if new_depth > 0 {
            info!(breadth = new_breadth, depth = new_depth, "Researching deeper");

            progress.complete_query(ProgressUpdate {
                current_depth: Some(new_depth),
                current_breadth: Some(new_breadth),
                current_query: Some(sub_query.query.clone()),
                ..Default::default()
            });

            let follow_ups: Vec<String> = summary
                .follow_up_questions
                .into_iter()
                .take(new_breadth)
                .collect();

            let next = ResearchTask {
                query: compose_next_query(&sub_query.research_goal, &follow_ups),
                breadth: new_breadth,
                depth: new_depth,
                learnings,
                visited_urls,
            };

            Ok(self.research(next, progress).await)
        } else {
            progress.complete_query(ProgressUpdate {
                current_depth: Some(0),
                current_query: Some(sub_query.query.clone()),
                ..Default::default()
            });

            Ok(ResearchResult {
                learnings,
                visited_urls,
            })
        }
    }
}
