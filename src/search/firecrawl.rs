//! Firecrawl Client
//!
//! Calls the Firecrawl `/v1/search` endpoint, which runs a web search and
//! scrapes each hit in one request. Self-hosted instances work by pointing
//! `FIRECRAWL_BASE_URL` at them; the API key is optional there.

use crate::search::{ContentFormat, SearchDocument, SearchError, SearchOptions, SearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Extra time granted to the HTTP client on top of the server-side timeout
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
    /// Milliseconds
    timeout: u64,
    scrape_options: ScrapeOptions,
}

#[derive(Serialize)]
struct ScrapeOptions {
    formats: Vec<ContentFormat>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<SearchHit>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SearchHit {
    url: Option<String>,
    markdown: Option<String>,
    html: Option<String>,
}

pub struct FirecrawlClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            client: Client::new(),
            api_key: (!api_key.is_empty()).then_some(api_key),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Configure client from config. Hosted Firecrawl needs a key; a custom
    /// base URL is assumed to be self-hosted and may run without one.
    pub fn from_config(config: &crate::config::SearchConfig) -> Result<Self, SearchError> {
        let hosted = config.firecrawl_base_url.contains("api.firecrawl.dev");
        if hosted && config.firecrawl_api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }
        Ok(Self::new(
            config.firecrawl_api_key.clone(),
            config.firecrawl_base_url.clone(),
        ))
    }
}

#[async_trait]
impl SearchProvider for FirecrawlClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchDocument>, SearchError> {
        info!(query = %query, limit = options.max_results, "Searching via Firecrawl");

        let body = SearchRequest {
            query,
            limit: options.max_results,
            timeout: options.timeout.as_millis() as u64,
            scrape_options: ScrapeOptions {
                formats: vec![options.format],
            },
        };

        let mut request = self
            .client
            .post(format!("{}/v1/search", self.base_url))
            .timeout(options.timeout + CLIENT_TIMEOUT_SLACK)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout(options.timeout)
            } else {
                SearchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::REQUEST_TIMEOUT {
            return Err(SearchError::Timeout(options.timeout));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        if !parsed.success {
            let message = parsed.error.unwrap_or_else(|| "unknown error".to_string());
            if message.to_lowercase().contains("timeout") {
                return Err(SearchError::Timeout(options.timeout));
            }
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let documents: Vec<SearchDocument> = parsed
            .data
            .into_iter()
            .take(options.max_results)
            .map(|hit| SearchDocument {
                url: hit.url,
                content: match options.format {
                    ContentFormat::Markdown => hit.markdown,
                    ContentFormat::Html => hit.html,
                },
            })
            .collect();

        debug!(query = %query, count = documents.len(), "Firecrawl search completed");
        Ok(documents)
    }
}
