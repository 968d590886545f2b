use crate::render::{row_line, tree_summary};
use anyhow::{Context, Result};
use chatforest_core::{RecordFilter, Scope, SortConfig};
use chatforest_panel::{CacheManager, JsonRecordSource};
use chatforest_runtime_config::PanelConfig;
use std::path::Path;

pub struct TreeOptions {
    pub sort: Option<SortConfig>,
    pub search: Option<String>,
    pub show_checkpoints: bool,
    pub flat: bool,
    pub expand_all: bool,
}

/// Print the session forest (or flat root list) read from a records file.
pub async fn run_tree(file: &Path, config: PanelConfig, opts: TreeOptions) -> Result<()> {
    let show_checkpoints = opts.show_checkpoints || config.display.show_checkpoints;
    let manager = CacheManager::new(JsonRecordSource::new(file), config);
    manager
        .load_chats(true)
        .await
        .with_context(|| format!("Failed to load sessions from {}", file.display()))?;

    manager.with_view_mut(|view| {
        if let Some(sort) = opts.sort {
            view.set_sort(sort);
        }
        view.set_filter(RecordFilter::new(opts.search.clone(), show_checkpoints));
    });

    let lines: Vec<String> = manager.with_view_mut(|view| {
        if opts.flat {
            let mut flat = view.flat_tree();
            if opts.expand_all {
                flat.set_all_expanded(true);
            }
            return flat.visible_nodes().map(|row| row_line(&row)).collect();
        }

        let forest = view.forest_mut();
        if opts.expand_all {
            forest.set_all_expanded(Scope::Forest, true);
        }
        let mut lines = Vec::new();
        for (i, tree) in forest.trees().iter().enumerate() {
            lines.push(tree_summary(tree));
            lines.extend(forest.visible_nodes(i).map(|row| row_line(&row)));
        }
        lines
    });

    if lines.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }

    let total = manager.with_view(|view| view.forest().total_count());
    println!();
    println!("Total: {total} session(s)");
    Ok(())
}
