use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use crate::models::{AppState, DeepResearchRequest, DeepResearchResponse, ResearchJob};
use crate::research::{ProgressCallback, ResearchProgress};
use crate::types::{AppError, AppResult};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/deep-research/start", post(start_deep_research))
        .route("/api/deep-research/status/{job_id}", get(get_status))
        .with_state(state)
}

async fn start_deep_research(
    State(state): State<AppState>,
    Json(request): Json<DeepResearchRequest>,
) -> AppResult<Json<DeepResearchResponse>> {
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("query must not be empty".to_string()));
    }

    let defaults = &state.config.research;
    let breadth = request.breadth.unwrap_or(defaults.default_breadth);
    let depth = request.depth.unwrap_or(defaults.default_depth);
    if breadth == 0 {
        return Err(AppError::InvalidRequest("breadth must be at least 1".to_string()));
    }

    let job = ResearchJob::new(query.clone(), breadth, depth, request.mode);
    let job_id = job.id;
    let status = job.status;
    state.jobs.insert(job);

    info!(job_id = %job_id, breadth, depth, mode = ?request.mode, "Starting deep research job");

    let jobs = state.jobs.clone();
    let on_progress: ProgressCallback = Arc::new(move |progress: &ResearchProgress| {
        jobs.update(&job_id, |job| job.progress = progress.clone());
    });

    let pipeline = state.pipeline.clone();
    let jobs = state.jobs.clone();
    let mode = request.mode;
    tokio::spawn(async move {
        let result = pipeline
            .researcher
            .deep_research(&query, breadth, depth, Some(on_progress))
            .await;

        let output = pipeline
            .reports
            .write(mode, &query, &result.learnings, &result.visited_urls)
            .await
            .map_err(|e| {
                warn!(job_id = %job_id, error = %e, "Failed to write research output");
                e.to_string()
            });

        jobs.update(&job_id, |job| job.finish(result, output));
        info!(job_id = %job_id, "Deep research job finished");
    });

    Ok(Json(DeepResearchResponse { job_id, status }))
}

async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<ResearchJob>> {
    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("research job {}", job_id)))
}
