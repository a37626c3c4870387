//! Search Module
//!
//! Web search for research branches. The engine only sees the
//! [`SearchProvider`] trait; [`FirecrawlClient`] is the production backend,
//! returning scraped page content as markdown.

pub mod firecrawl;

pub use firecrawl::FirecrawlClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key not configured")]
    NoApiKey,

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

/// Content format requested from the scraper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Markdown,
    Html,
}

/// Per-call search options
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub timeout: Duration,
    pub max_results: usize,
    pub format: ContentFormat,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_results: 5,
            format: ContentFormat::Markdown,
        }
    }
}

/// A single search hit. Either field may be missing depending on what the
/// scraper managed to fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub url: Option<String>,
    pub content: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchDocument>, SearchError>;
}
