// Deep Research - recursive web research engine driven by LLMs

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Web search providers (Firecrawl)
pub mod research;  // Recursive engine: gate, branches, merge, progress
pub mod routes;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use research::{DeepResearcher, ResearchResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
