use crate::ChatRecord;
use chrono::{DateTime, TimeZone, Utc};

/// Fixed base instant so fixtures are reproducible.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Timestamp `secs` seconds after [`base_time`].
pub fn at(secs: i64) -> DateTime<Utc> {
    base_time() + chrono::Duration::seconds(secs)
}

/// Record with `updated_at = at(updated)`, created one hour earlier,
/// name `<id>.jsonl` and one message.
pub fn record(id: &str, updated: i64) -> ChatRecord {
    ChatRecord {
        id: id.to_string(),
        name: format!("{id}.jsonl"),
        created_at: at(updated - 3_600),
        updated_at: at(updated),
        message_count: 1,
        first_message: format!("first message of {id}"),
        last_message: format!("last message of {id}"),
        parent_hint: None,
        is_checkpoint: false,
        is_active: false,
        opening_messages: Vec::new(),
    }
}

/// Record whose parent hint points at `parent`.
pub fn child_of(id: &str, updated: i64, parent: &str) -> ChatRecord {
    let mut rec = record(id, updated);
    rec.parent_hint = Some(parent.to_string());
    rec
}

/// Record carrying the given opening messages and message count.
pub fn with_messages(id: &str, updated: i64, messages: &[&str], total: u64) -> ChatRecord {
    let mut rec = record(id, updated);
    rec.opening_messages = messages.iter().map(|m| (*m).to_string()).collect();
    rec.message_count = total;
    rec
}

/// Ids in iteration order, for compact assertions.
pub fn ids<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    records.into_iter().map(|r| r.id.clone()).collect()
}
