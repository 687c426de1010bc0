//! Training command implementation.

use crate::commands::types::TrainArgs;
use crate::config::load_resolved;
use anyhow::{Context, Result};
use colored::Colorize;
use kiln_core::{default_schema, EpochTrainer, TextClassifier};
use kiln_training::{
    bootstrap, run, ArtifactKind, ProgressSink, RunContext, RunId, RunLayout, StdoutProgressSink,
    TracingProgressSink,
};

pub fn execute(args: TrainArgs) -> Result<()> {
    let schema = default_schema().context("Failed to build configuration schema")?;
    let config = load_resolved(&schema, &args.source)?;

    let layout = RunLayout::new(args.output_dir);
    let run_id = RunId::new();
    layout
        .record_inputs(&run_id, &config, &args.source.overrides)
        .with_context(|| format!("Failed to record run inputs under {}", layout.root().display()))?;

    // JSON mode keeps stdout for the manifest only.
    let progress: Box<dyn ProgressSink> =
        if args.json { Box::new(TracingProgressSink) } else { Box::new(StdoutProgressSink) };
    let ctx = RunContext::new(run_id.clone()).with_layout(layout.clone()).with_progress(progress);

    let bootstrapped =
        bootstrap::<TextClassifier, EpochTrainer>(&config, ctx).context("Failed to set up training")?;
    let manifest = run(bootstrapped).context("Training failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    println!();
    println!("{}", "Training complete".bold().green());
    println!("  Run: {}", manifest.run_id.0.cyan());
    println!("  Epochs: {}  Steps: {}", manifest.metrics.epochs, manifest.metrics.steps);
    if let Some(loss) = manifest.metrics.train_loss {
        println!("  Loss: {loss:.4}");
    }
    if let Some(accuracy) = manifest.metrics.train_accuracy {
        println!("  Accuracy: {accuracy:.3}");
    }
    if let Some(checkpoint) = manifest.artifact(&ArtifactKind::Checkpoint) {
        println!("  Checkpoint: {}", checkpoint.path.display().to_string().dimmed());
    }
    println!("  Manifest: {}", layout.manifest_path(&run_id).display().to_string().dimmed());
    println!();
    Ok(())
}
