//! Branch-relation resolution: which chat session continues which.
//!
//! Two strategies share one entry point. When the source reports parent
//! hints, they are resolved through an alias table of every identity form a
//! record is known by. Without hints, sessions that open with the same
//! messages are paired up and the longer one is taken as the parent.

use crate::record::strip_session_suffix;
use crate::ChatRecord;
use std::collections::HashMap;
use tracing::debug;

/// Child id -> parent id. Absent entries mean "no known parent".
pub type ParentMap = HashMap<String, String>;

/// Number of opening messages compared by the similarity fallback.
pub const SIMILARITY_WINDOW: usize = 5;

/// Minimum shared prefix length for two sessions to be considered related.
pub const SIMILARITY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSource {
    /// Parent hints carried by the records themselves.
    MetadataDriven,
    /// Shared opening messages, used when no record carries a hint.
    ContentSimilarityFallback,
}

impl RelationSource {
    /// Pick the strategy for one fetch.
    pub fn select(records: &[ChatRecord]) -> Self {
        if records.iter().any(|r| r.parent_hint().is_some()) {
            Self::MetadataDriven
        } else {
            Self::ContentSimilarityFallback
        }
    }

    pub fn resolve(&self, records: &[ChatRecord]) -> ParentMap {
        match self {
            Self::MetadataDriven => resolve_from_hints(records),
            Self::ContentSimilarityFallback => resolve_from_similarity(records),
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Self::MetadataDriven => "metadata",
            Self::ContentSimilarityFallback => "content-similarity",
        }
    }
}

/// Resolve parents with whichever strategy the records support.
pub fn resolve_parents(records: &[ChatRecord]) -> ParentMap {
    let source = RelationSource::select(records);
    let parents = source.resolve(records);
    debug!(
        strategy = source.display(),
        records = records.len(),
        links = parents.len(),
        "resolved session lineage"
    );
    parents
}

/// Every identity form (id, name, name without suffix) -> canonical id.
/// Ids are registered first so a name can never shadow another record's id.
fn alias_table(records: &[ChatRecord]) -> HashMap<&str, &str> {
    let mut aliases: HashMap<&str, &str> = HashMap::with_capacity(records.len() * 3);
    for rec in records {
        aliases.entry(rec.id.trim()).or_insert(rec.id.as_str());
    }
    for rec in records {
        let name = rec.name.trim();
        if name.is_empty() {
            continue;
        }
        aliases.entry(name).or_insert(rec.id.as_str());
        let stem = strip_session_suffix(name);
        if !stem.is_empty() {
            aliases.entry(stem).or_insert(rec.id.as_str());
        }
    }
    aliases
}

fn resolve_from_hints(records: &[ChatRecord]) -> ParentMap {
    let aliases = alias_table(records);
    let mut parents = ParentMap::new();

    for rec in records {
        let Some(hint) = rec.parent_hint() else {
            continue;
        };
        let resolved = aliases
            .get(hint)
            .or_else(|| aliases.get(strip_session_suffix(hint)));
        match resolved {
            Some(parent_id) if *parent_id != rec.id => {
                parents.insert(rec.id.clone(), (*parent_id).to_string());
            }
            Some(_) => debug!(id = %rec.id, "ignoring self-referencing parent hint"),
            None => debug!(id = %rec.id, hint, "parent hint matches no known session"),
        }
    }

    parents
}

/// Length of the shared ordered prefix among the first
/// [`SIMILARITY_WINDOW`] opening messages.
pub fn similarity(a: &ChatRecord, b: &ChatRecord) -> usize {
    a.opening_messages
        .iter()
        .zip(b.opening_messages.iter())
        .take(SIMILARITY_WINDOW)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Of two related records, the one the other branched from: more messages
/// wins, then the earlier creation time, then input order (`a` first).
fn parent_of<'a>(a: &'a ChatRecord, b: &'a ChatRecord) -> (&'a ChatRecord, &'a ChatRecord) {
    if a.message_count != b.message_count {
        if a.message_count > b.message_count {
            (a, b)
        } else {
            (b, a)
        }
    } else if a.created_at <= b.created_at {
        (a, b)
    } else {
        (b, a)
    }
}

/// Pairs are visited in index order and written straight into the map, so
/// a record related to several others keeps whichever pair came last.
fn resolve_from_similarity(records: &[ChatRecord]) -> ParentMap {
    let mut parents = ParentMap::new();

    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if similarity(a, b) < SIMILARITY_THRESHOLD {
                continue;
            }
            let (parent, child) = parent_of(a, b);
            parents.insert(child.id.clone(), parent.id.clone());
        }
    }

    parents
}
