use crate::agents::{ReportMode, ResearchPipeline};
use crate::config::Config;
use crate::research::{ResearchProgress, ResearchResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<ResearchPipeline>,
    pub jobs: JobRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// A research run started through the HTTP API. Lives only in memory.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResearchJob {
    pub id: Uuid,
    pub query: String,
    pub breadth: usize,
    pub depth: usize,
    pub mode: ReportMode,
    pub status: JobStatus,
    pub progress: ResearchProgress,
    pub learnings: Vec<String>,
    pub visited_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResearchJob {
    pub fn new(query: String, breadth: usize, depth: usize, mode: ReportMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            breadth,
            depth,
            mode,
            status: JobStatus::Running,
            progress: ResearchProgress {
                current_depth: depth,
                total_depth: depth,
                current_breadth: breadth,
                total_breadth: breadth,
                ..ResearchProgress::default()
            },
            learnings: Vec::new(),
            visited_urls: Vec::new(),
            output: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record the engine result and the report outcome
    pub fn finish(&mut self, result: ResearchResult, output: Result<String, String>) {
        self.learnings = result.learnings;
        self.visited_urls = result.visited_urls;
        match output {
            Ok(text) => {
                self.status = JobStatus::Completed;
                self.output = Some(text);
            }
            Err(error) => {
                self.status = JobStatus::Failed;
                self.error = Some(error);
            }
        }
        self.completed_at = Some(Utc::now());
    }
}

/// Default time a finished job stays queryable
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(3600);

/// In-memory job store. Finished jobs are evicted once they are older than the
/// retention window; running jobs are never evicted.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, ResearchJob>>>,
    retention: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_JOB_RETENTION)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub fn insert(&self, job: ResearchJob) {
        self.evict_expired();
        self.write().insert(job.id, job);
    }

    pub fn get(&self, id: &Uuid) -> Option<ResearchJob> {
        self.read().get(id).cloned()
    }

    /// Apply `f` to the job if it exists
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut ResearchJob)) {
        if let Some(job) = self.write().get_mut(id) {
            f(job);
        }
    }

    /// Drop finished jobs past the retention window. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let retention = self.retention;
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            Some(completed_at) => (now - completed_at)
                .to_std()
                .map(|age| age < retention)
                .unwrap_or(true),
            None => true,
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!(evicted, remaining = jobs.len(), "Evicted finished research jobs");
        }
        evicted
    }

    pub fn count_running(&self) -> usize {
        self.read()
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .count()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, ResearchJob>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, ResearchJob>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct DeepResearchRequest {
    pub query: String,
    pub breadth: Option<usize>,
    pub depth: Option<usize>,
    #[serde(default)]
    pub mode: ReportMode,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct DeepResearchResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub running_jobs: usize,
}
