use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub research: ResearchConfig,
    pub search: SearchConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    /// Finished jobs are dropped from memory after this many seconds
    pub job_retention_secs: u64,
}

impl ServerConfig {
    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }
}

/// Engine tuning knobs.
///
/// `concurrency_limit` bounds the branches in flight *per recursion level*. Every
/// level builds its own gate, so a run of depth `d` can have up to
/// `concurrency_limit * d` branches active at once. Size provider rate limits
/// accordingly.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    pub concurrency_limit: usize,
    pub default_breadth: usize,
    pub default_depth: usize,
    pub search_timeout_secs: u64,
    pub summarize_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub firecrawl_api_key: String,
    pub firecrawl_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub model: String,
    pub openai_api_key: String,
    pub openai_endpoint: Option<String>,
    pub openrouter_api_key: String,
    pub groq_api_key: String,
}

impl LLMConfig {
    /// API key for the configured provider, if one is set
    pub fn active_api_key(&self) -> Option<String> {
        let key = match self.provider {
            LLMProvider::OpenAI | LLMProvider::Custom => &self.openai_api_key,
            LLMProvider::OpenRouter => &self.openrouter_api_key,
            LLMProvider::Groq => &self.groq_api_key,
        };
        if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

impl ResearchConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_secs(self.summarize_timeout_secs)
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 2,
            default_breadth: 4,
            default_depth: 2,
            search_timeout_secs: 15,
            summarize_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let research = ResearchConfig {
            concurrency_limit: parse_var("FIRECRAWL_CONCURRENCY", 2)?,
            default_breadth: parse_var("RESEARCH_BREADTH", 4)?,
            default_depth: parse_var("RESEARCH_DEPTH", 2)?,
            search_timeout_secs: parse_var("SEARCH_TIMEOUT_SECS", 15)?,
            summarize_timeout_secs: parse_var("SUMMARIZE_TIMEOUT_SECS", 60)?,
        };
        research.validate()?;

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", 3051)?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                job_retention_secs: parse_var("JOB_RETENTION_SECS", 3600)?,
            },
            research,
            search: SearchConfig {
                firecrawl_api_key: env::var("FIRECRAWL_KEY").unwrap_or_default(),
                firecrawl_base_url: env::var("FIRECRAWL_BASE_URL")
                    .unwrap_or_else(|_| "https://api.firecrawl.dev".to_string()),
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER")
                    .unwrap_or_else(|_| "openai".to_string())
                    .parse()?,
                model: env::var("CUSTOM_MODEL")
                    .or_else(|_| env::var("LLM_MODEL"))
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                openai_api_key: env::var("OPENAI_KEY")
                    .or_else(|_| env::var("OPENAI_API_KEY"))
                    .unwrap_or_default(),
                openai_endpoint: env::var("OPENAI_ENDPOINT").ok(),
                openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
                groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            },
        })
    }
}

impl ResearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            bail!("FIRECRAWL_CONCURRENCY must be at least 1");
        }
        if self.default_breadth == 0 {
            bail!("RESEARCH_BREADTH must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", name, raw, e)),
        _ => Ok(default),
    }
}
