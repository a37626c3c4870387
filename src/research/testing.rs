//! In-memory collaborators for engine tests.

use super::{
    DeepResearcher, EngineSettings, ProgressCallback, QueryGenerator, ResearchProgress, SubQuery,
    Summarizer, Summary,
};
use crate::search::{SearchDocument, SearchError, SearchOptions, SearchProvider};
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn researcher(
    generator: Arc<MockGenerator>,
    search: Arc<MockSearch>,
    summarizer: Arc<MockSummarizer>,
) -> DeepResearcher {
    DeepResearcher::new(generator, search, summarizer, EngineSettings::default())
}

pub(crate) fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<ResearchProgress>>>) {
    let history = Arc::new(Mutex::new(Vec::new()));
    let sink = history.clone();
    let callback: ProgressCallback = Arc::new(move |progress: &ResearchProgress| {
        sink.lock().unwrap().push(progress.clone());
    });
    (callback, history)
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub(crate) struct GenerateCall {
    pub prompt: String,
    pub max_count: usize,
    pub learnings: Vec<String>,
}

/// Call `n` yields `q{n}.0 .. q{n}.{max_count-1}` unless a fixed first answer is set
#[derive(Default)]
pub(crate) struct MockGenerator {
    first: Option<Vec<String>>,
    always_fail: bool,
    fail_after_first: bool,
    empty_after_first: bool,
    calls: Mutex<Vec<GenerateCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(queries: &[&str]) -> Self {
        Self {
            first: Some(queries.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn fail_after_first(mut self) -> Self {
        self.fail_after_first = true;
        self
    }

    pub fn empty_after_first(mut self) -> Self {
        self.empty_after_first = true;
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryGenerator for MockGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_count: usize,
        learnings: &[String],
    ) -> AppResult<Vec<SubQuery>> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(GenerateCall {
                prompt: prompt.to_string(),
                max_count,
                learnings: learnings.to_vec(),
            });
            calls.len() - 1
        };

        if self.always_fail || (self.fail_after_first && n > 0) {
            return Err(AppError::LLMApi("generator unavailable".to_string()));
        }
        if self.empty_after_first && n > 0 {
            return Ok(Vec::new());
        }

        let names: Vec<String> = match (&self.first, n) {
            (Some(first), 0) => first.clone(),
            _ => (0..max_count).map(|i| format!("q{}.{}", n, i)).collect(),
        };

        Ok(names
            .into_iter()
            .map(|query| SubQuery {
                research_goal: format!("goal of {}", query),
                query,
            })
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MockSearch {
    hang: HashSet<String>,
    fail: HashSet<String>,
    delay: Option<Duration>,
    shared_url: Option<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, SearchOptions)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hang_on(mut self, query: &str) -> Self {
        self.hang.extend(set(&[query]));
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.fail.extend(set(&[query]));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_shared_url(mut self, url: &str) -> Self {
        self.shared_url = Some(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, SearchOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchDocument>, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), options.clone()));

        if self.fail.contains(query) {
            return Err(SearchError::RequestFailed("connection reset".to_string()));
        }
        if self.hang.contains(query) {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut documents = vec![
            SearchDocument {
                url: Some(format!("https://example.com/{}", query)),
                content: Some(format!("content for {}", query)),
            },
            SearchDocument {
                url: None,
                content: Some("page without url".to_string()),
            },
            SearchDocument {
                url: Some("  ".to_string()),
                content: None,
            },
        ];
        if let Some(url) = &self.shared_url {
            documents.push(SearchDocument {
                url: Some(url.clone()),
                content: Some("shared page".to_string()),
            });
        }
        Ok(documents)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SummarizeCall {
    pub query: String,
    pub contents: Vec<String>,
    pub max_learnings: usize,
    pub max_follow_ups: usize,
}

/// Returns `learning about {query}` and `follow-up {i} for {query}`
#[derive(Default)]
pub(crate) struct MockSummarizer {
    hang: HashSet<String>,
    fail: HashSet<String>,
    shared_learning: Option<String>,
    calls: Mutex<Vec<SummarizeCall>>,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hang_on(mut self, query: &str) -> Self {
        self.hang.extend(set(&[query]));
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.fail.extend(set(&[query]));
        self
    }

    pub fn with_shared_learning(mut self, learning: &str) -> Self {
        self.shared_learning = Some(learning.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SummarizeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        query: &str,
        contents: &[String],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> AppResult<Summary> {
        self.calls.lock().unwrap().push(SummarizeCall {
            query: query.to_string(),
            contents: contents.to_vec(),
            max_learnings,
            max_follow_ups,
        });

        if self.fail.contains(query) {
            return Err(AppError::Parse("malformed summary".to_string()));
        }
        if self.hang.contains(query) {
            std::future::pending::<()>().await;
        }

        let mut learnings = vec![format!("learning about {}", query)];
        learnings.extend(self.shared_learning.clone());

        Ok(Summary {
            learnings,
            follow_up_questions: (0..max_follow_ups)
                .map(|i| format!("follow-up {} for {}", i, query))
                .collect(),
        })
    }
}
