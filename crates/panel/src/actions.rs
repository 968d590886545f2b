//! Mutations issued from the panel and the cache discipline around them.

use crate::cache::CacheManager;
use crate::error::{PanelError, Result};
use crate::source::{RecordSource, SessionMutations};
use std::time::Duration;
use tracing::{info, warn};

/// Aggregate result of a sequential batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteResult {
    pub success_count: usize,
    pub fail_count: usize,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Empty,
    AllSucceeded,
    Partial,
    AllFailed,
}

impl BatchDeleteResult {
    pub fn outcome(&self) -> BatchOutcome {
        match (self.success_count, self.fail_count) {
            (0, 0) => BatchOutcome::Empty,
            (_, 0) => BatchOutcome::AllSucceeded,
            (0, _) => BatchOutcome::AllFailed,
            _ => BatchOutcome::Partial,
        }
    }

    fn record_failure(&mut self, id: &str) {
        self.fail_count += 1;
        self.failed_ids.push(id.to_string());
    }
}

impl<S: RecordSource> CacheManager<S> {
    /// Delete `ids` one at a time, pausing between calls. A failed item never
    /// stops the batch. Afterwards the cache is dropped and, once the backend
    /// had time to settle, the view is reloaded in the foreground.
    pub async fn delete_records<M: SessionMutations>(
        &self,
        mutations: &M,
        ids: &[String],
    ) -> BatchDeleteResult {
        let owner = self.source().owner();
        let pacing = &self.config().delete;
        let mut result = BatchDeleteResult::default();

        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(pacing.inter_call_delay_ms)).await;
            }
            let Some(name) = self.with_view(|v| v.record(id).map(|r| r.name.clone())) else {
                warn!(id = %id, "cannot delete unknown session");
                result.record_failure(id);
                continue;
            };
            match mutations.delete_record(&owner, &name).await {
                Ok(true) => result.success_count += 1,
                Ok(false) => {
                    warn!(id = %id, "backend refused to delete session");
                    result.record_failure(id);
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "failed to delete session");
                    result.record_failure(id);
                }
            }
        }

        info!(
            deleted = result.success_count,
            failed = result.fail_count,
            "batch delete finished"
        );

        self.invalidate();
        if !ids.is_empty() {
            tokio::time::sleep(Duration::from_millis(pacing.settle_delay_ms)).await;
        }
        if let Err(e) = self.load_chats(true).await {
            warn!(error = %e, "reload after delete failed");
        }
        result
    }

    /// Delete every selected session of the displayed forest.
    ///
    /// With `display.confirm_delete` set, `confirm` is asked with the
    /// selected ids first; declining returns `None` and leaves backend,
    /// cache and view untouched. An empty selection never asks.
    pub async fn delete_selected<M, F>(
        &self,
        mutations: &M,
        confirm: F,
    ) -> Option<BatchDeleteResult>
    where
        M: SessionMutations,
        F: FnOnce(&[String]) -> bool,
    {
        let ids: Vec<String> = self.with_view(|v| {
            let forest = v.forest();
            forest
                .selected_nodes()
                .into_iter()
                .map(|id| forest.arena()[id].id().to_string())
                .collect()
        });
        if !ids.is_empty() && self.config().display.confirm_delete && !confirm(&ids) {
            info!(selected = ids.len(), "batch delete cancelled");
            return None;
        }
        Some(self.delete_records(mutations, &ids).await)
    }

    /// Rename a session. A successful rename drops the cache and reloads.
    pub async fn rename_record<M: SessionMutations>(
        &self,
        mutations: &M,
        id: &str,
        new_name: &str,
    ) -> Result<bool> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(PanelError::Mutation("session name cannot be empty".to_string()));
        }
        if self.with_view(|v| v.record(id).is_none()) {
            return Err(PanelError::UnknownRecord(id.to_string()));
        }

        let renamed = mutations.rename_record(id, new_name).await?;
        if renamed {
            self.invalidate();
            self.load_chats(true).await?;
        } else {
            warn!(id, "backend refused to rename session");
        }
        Ok(renamed)
    }

    /// Open a session. Leaves cache and view alone.
    pub async fn open_record<M: SessionMutations>(&self, mutations: &M, id: &str) -> Result<bool> {
        if self.with_view(|v| v.record(id).is_none()) {
            return Err(PanelError::UnknownRecord(id.to_string()));
        }
        mutations.open_record(id).await
    }
}
