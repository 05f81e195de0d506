//! Run registry: the in-memory store of run state.
//!
//! The registry is the single source of truth for a run's progress and
//! status. It is volatile by design; nothing survives the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::run::{RunConfig, RunState, RunUpdate};

/// Keyed store of mutable run state.
pub struct RunStore {
    /// Map of run ID to run state.
    runs: Arc<RwLock<HashMap<String, RunState>>>,
}

impl fmt::Debug for RunStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunStore")
            .field("run_count", &self.runs.try_read().map(|r| r.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl RunStore {
    /// Creates a new empty run store.
    #[must_use]
    pub fn new() -> Self {
        Self { runs: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Creates a new run in Pending state and returns its ID.
    ///
    /// # Arguments
    /// * `filename` - Source document filename
    /// * `config` - Generation configuration for the run
    pub async fn create(&self, filename: &str, config: RunConfig) -> String {
        let run_id = Uuid::new_v4().to_string();
        debug!(run_id = %run_id, filename = %filename, "Creating run");

        let run = RunState::new(run_id.clone(), filename.to_string(), config);
        let mut runs = self.runs.write().await;
        runs.insert(run_id.clone(), run);
        run_id
    }

    /// Retrieves a snapshot of a run by ID.
    ///
    /// # Returns
    /// Returns `Some(RunState)` if found, `None` otherwise; absence is not
    /// an error and callers must handle it.
    pub async fn get(&self, run_id: &str) -> Option<RunState> {
        let runs = self.runs.read().await;
        runs.get(run_id).cloned()
    }

    /// Merges a partial update into a stored run.
    ///
    /// Only the fields set on the update are written; `updated_at` is
    /// refreshed. The merge happens under the write lock, so concurrent
    /// callers never observe a half-applied update.
    ///
    /// # Returns
    /// Returns `false` if the run does not exist.
    pub async fn update(&self, run_id: &str, update: RunUpdate) -> bool {
        let mut runs = self.runs.write().await;
        let Some(run) = runs.get_mut(run_id) else {
            warn!(run_id = %run_id, "Attempted to update non-existent run");
            return false;
        };

        if let Some(new_status) = update.status() {
            if !run.status.can_transition_to(new_status) {
                warn!(
                    run_id = %run_id,
                    from = ?run.status,
                    to = ?new_status,
                    "Unexpected status transition"
                );
            }
        }

        update.apply(run);
        run.updated_at = chrono::Utc::now();
        true
    }

    /// Lists runs, newest creation time first.
    ///
    /// # Arguments
    /// * `limit` - Maximum number of runs to return
    pub async fn list(&self, limit: usize) -> Vec<RunState> {
        let runs = self.runs.read().await;
        let mut listed: Vec<RunState> = runs.values().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listed.truncate(limit);
        listed
    }

    /// Deletes a run.
    ///
    /// # Returns
    /// Returns `true` if the run was found and removed, `false` otherwise.
    pub async fn delete(&self, run_id: &str) -> bool {
        let mut runs = self.runs.write().await;
        let removed = runs.remove(run_id).is_some();

        if removed {
            debug!(run_id = %run_id, "Deleted run");
        } else {
            warn!(run_id = %run_id, "Attempted to delete non-existent run");
        }

        removed
    }

    /// Returns the number of stored runs.
    pub async fn count(&self) -> usize {
        let runs = self.runs.read().await;
        runs.len()
    }
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStatus;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = RunStore::new();
        let run_id = store.create("requirements.pdf", RunConfig::default()).await;

        let run = store.get(&run_id).await.unwrap();
        assert_eq!(run.run_id, run_id);
        assert_eq!(run.filename, "requirements.pdf");
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent_run() {
        let store = RunStore::new();
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = RunStore::new();
        let run_id = store.create("spec.docx", RunConfig::default()).await;

        let updated = store
            .update(
                &run_id,
                RunUpdate::new()
                    .with_status(RunStatus::Analyzing)
                    .with_stage("feature_analyzer")
                    .with_progress(25),
            )
            .await;
        assert!(updated);

        let run = store.get(&run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Analyzing);
        assert_eq!(run.progress, 25);
        assert_eq!(run.filename, "spec.docx");
        assert!(run.updated_at >= run.created_at);
    }

    #[tokio::test]
    async fn test_update_nonexistent_run_returns_false() {
        let store = RunStore::new();
        let updated = store.update("nope", RunUpdate::new().with_progress(50)).await;
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = RunStore::new();
        let first = store.create("first.txt", RunConfig::default()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create("second.txt", RunConfig::default()).await;

        let listed = store.list(10).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].run_id, second);
        assert_eq!(listed[1].run_id, first);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = RunStore::new();
        for i in 0..5 {
            store.create(&format!("doc-{i}.txt"), RunConfig::default()).await;
        }
        assert_eq!(store.list(3).await.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_run() {
        let store = RunStore::new();
        let run_id = store.create("doc.txt", RunConfig::default()).await;

        assert!(store.delete(&run_id).await);
        assert!(store.get(&run_id).await.is_none());
        assert!(!store.delete(&run_id).await);
    }
}
