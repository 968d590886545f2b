use chatforest_core::{ChatRecord, Tree, VisibleNode};

/// Connector prefix for one visible row. Roots get none; the root's own
/// continuation has no column to draw in.
pub fn row_prefix(row: &VisibleNode<'_>) -> String {
    if row.continuations.is_empty() {
        return String::new();
    }
    let mut prefix = String::new();
    for continues in &row.continuations[1..] {
        prefix.push_str(if *continues { "│  " } else { "   " });
    }
    prefix.push_str(if row.is_last { "└─ " } else { "├─ " });
    prefix
}

pub fn record_label(record: &ChatRecord) -> String {
    let mut label = format!("{} ({} msgs)", record.title(), record.message_count);
    if record.is_active {
        label.push_str(" *");
    }
    if record.is_checkpoint {
        label.push_str(" [checkpoint]");
    }
    label
}

pub fn row_line(row: &VisibleNode<'_>) -> String {
    let marker = if row.node.has_children() && !row.node.expanded {
        " +"
    } else {
        ""
    };
    format!("{}{}{}", row_prefix(row), record_label(&row.node.record), marker)
}

pub fn tree_summary(tree: &Tree) -> String {
    let noun = if tree.node_count == 1 {
        "session"
    } else {
        "sessions"
    };
    format!(
        "── {} {}, updated {}",
        tree.node_count,
        noun,
        tree.latest_update.format("%Y-%m-%d %H:%M")
    )
}
