//! `kiln runs` subcommands.

use crate::commands::types::RunsCommand;
use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use std::path::Path;

pub fn execute(command: RunsCommand) -> Result<()> {
    match command {
        RunsCommand::List { output_dir, json } => list_runs(&output_dir, json),
    }
}

fn list_runs(output_dir: &Path, json_output: bool) -> Result<()> {
    let runs = kiln_training::discover_runs(output_dir)
        .with_context(|| format!("Failed to read runs from {}", output_dir.display()))?;

    if json_output {
        let out: Vec<_> = runs
            .into_iter()
            .map(|r| {
                json!({
                    "run_id": r.manifest.run_id.0,
                    "created_at": r.manifest.created_at,
                    "run_dir": r.run_dir,
                    "checkpoint_path": r.checkpoint_path,
                    "dataset_id": r.manifest.dataset_id,
                    "metrics": r.manifest.metrics,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Runs ({})", runs.len()).bold().cyan());
    println!();

    if runs.is_empty() {
        println!("  {}", format!("No finished runs under {}.", output_dir.display()).dimmed());
        println!();
        println!("  {}", "Tip: start one with `kiln train`.".dimmed());
        return Ok(());
    }

    println!("{:<26} {:<7} {:<8} {}", "Run", "Epochs", "Loss", "Checkpoint");
    println!("{}", "─".repeat(90));
    for r in runs {
        let loss = r.manifest.metrics.train_loss.map_or_else(|| "-".to_string(), |l| format!("{l:.4}"));
        let checkpoint = r.checkpoint_path.map_or_else(|| "-".to_string(), |p| p.display().to_string());
        println!(
            "{:<26} {:<7} {:<8} {}",
            r.manifest.run_id.0.cyan(),
            r.manifest.metrics.epochs,
            loss,
            checkpoint.dimmed()
        );
    }
    println!();
    Ok(())
}
