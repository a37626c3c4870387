//! Live progress for one top-level research run.
//!
//! One [`ProgressTracker`] is created per run and handed by reference down the
//! recursion. Every branch patches the same record; the callback receives a
//! full snapshot after each patch.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Caller-supplied progress sink. Must not block.
pub type ProgressCallback = Arc<dyn Fn(&ResearchProgress) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchProgress {
    pub current_depth: usize,
    pub total_depth: usize,
    pub current_breadth: usize,
    pub total_breadth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_query: Option<String>,
    pub total_queries: usize,
    pub completed_queries: usize,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current_depth: Option<usize>,
    pub current_breadth: Option<usize>,
    pub current_query: Option<String>,
}

impl ProgressUpdate {
    fn apply(self, progress: &mut ResearchProgress) {
        if let Some(depth) = self.current_depth {
            progress.current_depth = depth;
        }
        if let Some(breadth) = self.current_breadth {
            progress.current_breadth = breadth;
        }
        if let Some(query) = self.current_query {
            progress.current_query = Some(query);
        }
    }
}

#[derive(Clone)]
pub struct ProgressTracker {
    state: Arc<Mutex<ResearchProgress>>,
    on_progress: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(depth: usize, breadth: usize, on_progress: Option<ProgressCallback>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResearchProgress {
                current_depth: depth,
                total_depth: depth,
                current_breadth: breadth,
                total_breadth: breadth,
                current_query: None,
                total_queries: 0,
                completed_queries: 0,
            })),
            on_progress,
        }
    }

    /// A recursion level planned `count` more queries. Totals accumulate across
    /// levels so `completed_queries <= total_queries` holds for the whole run.
    pub fn add_planned_queries(&self, count: usize, first_query: Option<String>) {
        self.patch(|progress| {
            progress.total_queries += count;
            if first_query.is_some() {
                progress.current_query = first_query;
            }
        });
    }

    /// Count one finished branch step and apply `update` in the same patch
    pub fn complete_query(&self, update: ProgressUpdate) {
        self.patch(|progress| {
            let completed = progress.completed_queries + 1;
            update.apply(progress);
            progress.completed_queries = completed;
        });
    }

    pub fn snapshot(&self) -> ResearchProgress {
        self.lock().clone()
    }

    fn patch(&self, f: impl FnOnce(&mut ResearchProgress)) {
        let snapshot = {
            let mut progress = self.lock();
            f(&mut progress);
            progress.clone()
        };
        // Callback runs outside the lock so it may read the tracker again
        if let Some(callback) = &self.on_progress {
            callback(&snapshot);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResearchProgress> {
        // Plain counters, still usable after a poisoned patch
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("state", &self.snapshot())
            .field("has_callback", &self.on_progress.is_some())
            .finish()
    }
}
