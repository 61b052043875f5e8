//! Duplicate-customer merge command: `dealboard merge`.

use anyhow::Result;
use console::style;
use dealboard::config::DealboardConfig;
use dealboard::merge::{MergeSelection, MergeWorkflow};
use std::sync::Arc;

pub async fn cmd_merge(
    config: &DealboardConfig,
    primary: &str,
    duplicates: &[String],
    commit: bool,
) -> Result<()> {
    let selection = MergeSelection::new(primary, duplicates.iter().cloned())?;
    let mut workflow = MergeWorkflow::new(Arc::new(config.http_api()?));
    workflow.select(selection);

    let preview = workflow.run_preview().await?;
    println!(
        "{} {} ← {}",
        style("Merge preview").bold().cyan(),
        preview.primary_id,
        preview.duplicate_ids.join(", ")
    );
    if preview.conflicts.is_empty() {
        println!("  No field conflicts.");
    } else {
        println!("  Field conflicts:");
        for conflict in &preview.conflicts {
            println!(
                "    {}: keep {} over {}{}",
                style(&conflict.field).yellow(),
                conflict.primary_value,
                conflict.duplicate_value,
                conflict
                    .duplicate_id
                    .as_deref()
                    .map(|id| format!(" from {}", id))
                    .unwrap_or_default()
            );
        }
    }
    for (kind, count) in &preview.moved {
        println!("  {} {} would move", count, kind);
    }

    if !commit {
        println!();
        println!("Dry run only. Re-run with --commit to merge.");
        return Ok(());
    }

    let outcome = workflow.commit().await?;
    println!(
        "{} {} into {}",
        style("Merged").green().bold(),
        outcome.merged_ids.join(", "),
        outcome.primary_id
    );
    Ok(())
}
