//! Recursive Research Engine
//!
//! Expands a research prompt into a bounded tree of SERP queries:
//!
//! ```text
//! research(query, breadth, depth)
//!      │
//!      ▼
//! ┌──────────────┐
//! │ QueryGenerator│  → up to `breadth` sub-queries
//! └──────────────┘
//!      │  (ConcurrencyGate, `concurrency_limit` per level)
//!      ▼
//! ┌──────────────┐     ┌────────────┐
//! │   Branch     │ ──▶ │  Search    │ → documents
//! │  (per query) │ ──▶ │ Summarizer │ → learnings + follow-ups
//! └──────────────┘     └────────────┘
//!      │
//!      ├─ depth left → research(goal + follow-ups, ceil(breadth/2), depth-1)
//!      └─ depth spent → learnings + urls
//!      ▼
//!  merge (set union, first occurrence wins)
//! ```
//!
//! Branch failures (search/summarizer errors and timeouts) are logged and
//! pruned; they never propagate to the caller.

pub mod branch;
pub mod gate;
pub mod merge;
pub mod orchestrator;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use branch::{BranchError, BranchStage};
pub use gate::ConcurrencyGate;
pub use merge::merge_results;
pub use orchestrator::{DeepResearcher, EngineSettings};
pub use progress::{ProgressCallback, ProgressTracker, ProgressUpdate, ResearchProgress};

use crate::types::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Documents are trimmed to this many characters before summarization
pub const MAX_DOCUMENT_CHARS: usize = 25_000;

/// Learnings requested per branch
pub const LEARNINGS_PER_BRANCH: usize = 3;

/// A generated search query and the goal it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuery {
    pub query: String,
    pub research_goal: String,
}

/// Learnings and URLs gathered by a (sub)tree of the research run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub learnings: Vec<String>,
    pub visited_urls: Vec<String>,
}

impl ResearchResult {
    pub fn is_empty(&self) -> bool {
        self.learnings.is_empty() && self.visited_urls.is_empty()
    }
}

/// Output of the summarizer for one branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub learnings: Vec<String>,
    pub follow_up_questions: Vec<String>,
}

/// One recursion frame. Children receive extended copies of `learnings` and
/// `visited_urls`; a frame never mutates its parent's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchTask {
    pub query: String,
    pub breadth: usize,
    pub depth: usize,
    pub learnings: Vec<String>,
    pub visited_urls: Vec<String>,
}

impl ResearchTask {
    /// Root frame. A breadth of zero is treated as one.
    pub fn new(query: impl Into<String>, breadth: usize, depth: usize) -> Self {
        Self {
            query: query.into(),
            breadth: breadth.max(1),
            depth,
            learnings: Vec::new(),
            visited_urls: Vec::new(),
        }
    }

    /// Breadth for the next level: half of this one, rounded up
    pub fn next_breadth(&self) -> usize {
        self.breadth.div_ceil(2)
    }

    pub fn next_depth(&self) -> usize {
        self.depth.saturating_sub(1)
    }
}

#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Produce at most `max_count` distinct sub-queries for `prompt`. When
    /// `learnings` is non-empty the queries should build on them.
    async fn generate(
        &self,
        prompt: &str,
        max_count: usize,
        learnings: &[String],
    ) -> AppResult<Vec<SubQuery>>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        contents: &[String],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> AppResult<Summary>;
}
