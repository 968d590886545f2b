use crate::ChatRecord;

/// Search query plus checkpoint visibility, applied before forest building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub query: Option<String>,
    pub show_checkpoints: bool,
}

impl RecordFilter {
    pub fn new(query: Option<String>, show_checkpoints: bool) -> Self {
        Self {
            query,
            show_checkpoints,
        }
    }

    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, record: &ChatRecord) -> bool {
        if record.is_checkpoint && !self.show_checkpoints {
            return false;
        }
        let Some(needle) = self.needle() else {
            return true;
        };
        [&record.name, &record.first_message, &record.last_message]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Records passing the filter, in input order.
    pub fn apply(&self, records: &[ChatRecord]) -> Vec<ChatRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
