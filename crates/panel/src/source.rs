//! Collaborator contracts: where records come from and how sessions are
//! opened, renamed and deleted. The transport behind them is the host's
//! concern.

use crate::error::{PanelError, Result};
use chatforest_core::ChatRecord;
use std::future::Future;
use std::path::PathBuf;

/// Supplies the chat records of the active owner context.
pub trait RecordSource: Send + Sync + 'static {
    /// Identity of the owner context the next fetch reads from.
    fn owner(&self) -> String;

    /// All records of the owner, previews cut to `preview_length` chars.
    fn fetch(
        &self,
        preview_length: usize,
    ) -> impl Future<Output = Result<Vec<ChatRecord>>> + Send;
}

/// Session mutations. `Ok(false)` means the backend refused.
pub trait SessionMutations: Send + Sync {
    fn open_record(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    fn rename_record(
        &self,
        id: &str,
        new_name: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn delete_record(
        &self,
        owner_key: &str,
        record_name: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Reads a JSON array of records from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
    owner: String,
}

impl JsonRecordSource {
    /// The owner defaults to the file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let owner = path.display().to_string();
        Self { path, owner }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RecordSource for JsonRecordSource {
    fn owner(&self) -> String {
        self.owner.clone()
    }

    async fn fetch(&self, preview_length: usize) -> Result<Vec<ChatRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PanelError::Fetch(format!("read {}: {e}", self.path.display())))?;
        let mut records: Vec<ChatRecord> = serde_json::from_str(&content)?;
        for record in &mut records {
            record.truncate_previews(preview_length);
        }
        Ok(records)
    }
}
