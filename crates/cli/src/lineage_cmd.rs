use anyhow::{Context, Result};
use chatforest_core::RelationSource;
use chatforest_panel::{JsonRecordSource, RecordSource};
use std::path::Path;

/// Print the resolved child -> parent links of a records file.
pub async fn run_lineage(file: &Path, preview_length: usize) -> Result<()> {
    let records = JsonRecordSource::new(file)
        .fetch(preview_length)
        .await
        .with_context(|| format!("Failed to load sessions from {}", file.display()))?;

    let strategy = RelationSource::select(&records);
    let parents = strategy.resolve(&records);
    println!("Strategy: {}", strategy.display());

    if parents.is_empty() {
        println!("No branch relations found among {} session(s).", records.len());
        return Ok(());
    }

    // Input order keeps the output stable across runs.
    for record in &records {
        if let Some(parent) = parents.get(&record.id) {
            println!("  {} -> {}", record.id, parent);
        }
    }
    println!();
    println!(
        "Total: {} link(s) among {} session(s)",
        parents.len(),
        records.len()
    );
    Ok(())
}
