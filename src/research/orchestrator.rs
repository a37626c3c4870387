use super::{
    merge_results, ConcurrencyGate, ProgressCallback, ProgressTracker, QueryGenerator,
    ResearchResult, ResearchTask, Summarizer, LEARNINGS_PER_BRANCH, MAX_DOCUMENT_CHARS,
};
use crate::config::ResearchConfig;
use crate::search::SearchProvider;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Branches in flight per recursion level
    pub concurrency_limit: usize,
    pub search_timeout: Duration,
    pub summarize_timeout: Duration,
    pub max_search_results: usize,
    pub max_document_chars: usize,
    pub learnings_per_branch: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: super::gate::DEFAULT_CONCURRENCY_LIMIT,
            search_timeout: Duration::from_secs(15),
            summarize_timeout: Duration::from_secs(60),
            max_search_results: 5,
            max_document_chars: MAX_DOCUMENT_CHARS,
            learnings_per_branch: LEARNINGS_PER_BRANCH,
        }
    }
}

impl From<&ResearchConfig> for EngineSettings {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            search_timeout: config.search_timeout(),
            summarize_timeout: config.summarize_timeout(),
            ..Self::default()
        }
    }
}

/// Drives the research tree over the three collaborators
pub struct DeepResearcher {
    query_generator: Arc<dyn QueryGenerator>,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    settings: EngineSettings,
}

impl DeepResearcher {
    pub fn new(
        query_generator: Arc<dyn QueryGenerator>,
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn Summarizer>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            query_generator,
            search,
            summarizer,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub(crate) fn search_provider(&self) -> &dyn SearchProvider {
        self.search.as_ref()
    }

    pub(crate) fn summarizer(&self) -> &dyn Summarizer {
        self.summarizer.as_ref()
    }

    /// Run a full research tree for `query`. Never fails: branches that error
    /// out are pruned and the run returns whatever the rest produced.
    pub async fn deep_research(
        &self,
        query: &str,
        breadth: usize,
        depth: usize,
        on_progress: Option<ProgressCallback>,
    ) -> ResearchResult {
        let task = ResearchTask::new(query, breadth, depth);
        let progress = ProgressTracker::new(task.depth, task.breadth, on_progress);

        info!(breadth = task.breadth, depth = task.depth, "Starting deep research");
        let result = self.research(task, &progress).await;
        info!(
            learnings = result.learnings.len(),
            urls = result.visited_urls.len(),
            completed = progress.snapshot().completed_queries,
            "Deep research finished"
        );

        result
    }

    /// One level of the tree. Boxed because branches recurse back into it.
    pub fn research<'a>(
        &'a self,
        task: ResearchTask,
        progress: &'a ProgressTracker,
    ) -> BoxFuture<'a, ResearchResult> {
        async move {
            let sub_queries = match self
                .query_generator
                .generate(&task.query, task.breadth, &task.learnings)
                .await
            {
                Ok(mut queries) => {
                    queries.truncate(task.breadth);
                    queries
                }
                Err(e) => {
                    warn!(depth = task.depth, error = %e, "Query generation failed");
                    Vec::new()
                }
            };

            info!(count = sub_queries.len(), depth = task.depth, "Created SERP queries");
            progress.add_planned_queries(
                sub_queries.len(),
                sub_queries.first().map(|q| q.query.clone()),
            );

            if sub_queries.is_empty() {
                return ResearchResult::default();
            }

            let gate = ConcurrencyGate::new(self.settings.concurrency_limit);
            let branches = sub_queries
                .iter()
                .map(|sub_query| self.run_gated_branch(&gate, sub_query, &task, progress));
            let results = join_all(branches).await;

            merge_results(results)
        }
        .boxed()
    }
}
