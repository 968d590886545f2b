use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Trailing suffix carried by session files (`chat.jsonl`, `chat.json`).
static SESSION_FILE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.jsonl?$").expect("session suffix regex should compile"));

/// One chat session as reported by a record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Stable identifier, unique within one source response
    pub id: String,
    /// File-like storage name; doubles as the display name
    pub name: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, alias = "messageCount")]
    pub message_count: u64,
    #[serde(default, alias = "firstMessage")]
    pub first_message: String,
    #[serde(default, alias = "lastMessage")]
    pub last_message: String,
    /// Raw parent hint as written by the producer: an id or a file name
    #[serde(default, alias = "parentId", alias = "parent_id")]
    pub parent_hint: Option<String>,
    #[serde(default, alias = "isCheckpoint")]
    pub is_checkpoint: bool,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    /// Bodies of the opening messages, compared by the similarity fallback
    #[serde(default, alias = "openingMessages")]
    pub opening_messages: Vec<String>,
}

impl ChatRecord {
    /// Display title: the name without its session-file suffix.
    pub fn title(&self) -> &str {
        strip_session_suffix(&self.name)
    }

    /// Non-blank parent hint, trimmed.
    pub fn parent_hint(&self) -> Option<&str> {
        self.parent_hint
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
    }

    /// Cut both message previews down to `max_chars` characters.
    pub fn truncate_previews(&mut self, max_chars: usize) {
        truncate_chars(&mut self.first_message, max_chars);
        truncate_chars(&mut self.last_message, max_chars);
    }
}

/// Strip a trailing `.jsonl` / `.json` suffix, if any.
pub fn strip_session_suffix(name: &str) -> &str {
    match SESSION_FILE_SUFFIX_RE.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    UpdatedAt,
    CreatedAt,
    Name,
    MessageCount,
}

impl SortKey {
    pub fn display(&self) -> &'static str {
        match self {
            Self::UpdatedAt => "Last updated",
            Self::CreatedAt => "Created",
            Self::Name => "Name",
            Self::MessageCount => "Messages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Global ordering of records: `{ by, order }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortConfig {
    pub fn new(by: SortKey, order: SortOrder) -> Self {
        Self { by, order }
    }

    /// Comparator for `slice::sort_by`; equal keys compare `Equal` so a
    /// stable sort keeps input order.
    pub fn compare(&self, a: &ChatRecord, b: &ChatRecord) -> Ordering {
        let ord = match self.by {
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::MessageCount => a.message_count.cmp(&b.message_count),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Stable sort of `records` in place.
    pub fn sort(&self, records: &mut [ChatRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn title_strips_session_suffix_case_insensitively() {
        assert_eq!(strip_session_suffix("refactor.jsonl"), "refactor");
        assert_eq!(strip_session_suffix("refactor.JSON"), "refactor");
        assert_eq!(strip_session_suffix("refactor.json.bak"), "refactor.json.bak");
        assert_eq!(strip_session_suffix("plain"), "plain");
    }

    #[test]
    fn blank_parent_hint_is_treated_as_absent() {
        let mut rec = record("a", 1);
        rec.parent_hint = Some("   ".to_string());
        assert_eq!(rec.parent_hint(), None);

        rec.parent_hint = Some(" b ".to_string());
        assert_eq!(rec.parent_hint(), Some("b"));
    }

    #[test]
    fn truncate_previews_respects_char_boundaries() {
        let mut rec = record("a", 1);
        rec.first_message = "héllo wörld".to_string();
        rec.last_message = "ok".to_string();
        rec.truncate_previews(4);
        assert_eq!(rec.first_message, "héll");
        assert_eq!(rec.last_message, "ok");
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut records = vec![record("x", 5), record("y", 5), record("z", 9)];
        SortConfig::new(SortKey::UpdatedAt, SortOrder::Desc).sort(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut a = record("1", 1);
        a.name = "beta".to_string();
        let mut b = record("2", 1);
        b.name = "Alpha".to_string();
        let mut records = vec![a, b];
        SortConfig::new(SortKey::Name, SortOrder::Asc).sort(&mut records);
        assert_eq!(records[0].name, "Alpha");
    }

    #[test]
    fn record_accepts_camel_case_fields() {
        let rec: ChatRecord = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "c1.jsonl",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "messageCount": 4,
            "parentId": "p1",
            "isActive": true
        }))
        .expect("parse record");
        assert_eq!(rec.message_count, 4);
        assert_eq!(rec.parent_hint(), Some("p1"));
        assert!(rec.is_active);
        assert!(!rec.is_checkpoint);
        assert_eq!(rec.title(), "c1");
    }
}
