use super::config::TrainerOptions;
use kiln_training::{
    make_artifact, ArtifactKind, DataLoader, ProgressEvent, RunContext, RunManifest, RunMetrics, TrainableModel,
    TrainingArtifact, TrainingDriver, TrainingError, TrainingResult,
};
use serde::Serialize;
use std::path::Path;

/// Epoch-based training loop: every batch of every epoch gets one
/// optimizer step, until `max_epochs` or `max_steps` is reached.
#[derive(Debug)]
pub struct EpochTrainer {
    options: TrainerOptions,
    ctx: RunContext,
}

fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> TrainingResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

impl EpochTrainer {
    fn epochs(&self) -> u64 {
        if self.options.fast_dev_run { 1 } else { self.options.max_epochs }
    }

    fn batch_limit(&self) -> Option<usize> {
        if self.options.fast_dev_run { Some(1) } else { self.options.limit_train_batches }
    }

    fn emit(&self, event: ProgressEvent) {
        self.ctx.progress.on_event(event);
    }

    /// Artifacts already present in the run directory plus the checkpoint.
    fn collect_artifacts<M: TrainableModel>(&self, model: &M) -> TrainingResult<Vec<TrainingArtifact>> {
        let Some(layout) = &self.ctx.layout else {
            return Ok(Vec::new());
        };
        let run_id = &self.ctx.run_id;
        layout.ensure_run_dirs(run_id)?;

        let mut artifacts = Vec::new();
        if self.options.enable_checkpointing {
            let path = layout.checkpoints_dir(run_id).join("model.json");
            write_json(&path, &model.checkpoint()?)?;
            artifacts.push(make_artifact(ArtifactKind::Checkpoint, path)?);
        }
        for (kind, path) in [
            (ArtifactKind::ResolvedConfig, layout.resolved_config_path(run_id)),
            (ArtifactKind::Overrides, layout.overrides_path(run_id)),
        ] {
            if path.exists() {
                artifacts.push(make_artifact(kind, path)?);
            }
        }
        Ok(artifacts)
    }
}

impl TrainingDriver for EpochTrainer {
    type Options = TrainerOptions;

    fn from_options(options: TrainerOptions, ctx: RunContext) -> TrainingResult<Self> {
        if options.max_epochs == 0 && !options.fast_dev_run {
            return Err(TrainingError::Usage("trainer.max_epochs must be at least 1".to_string()));
        }
        tracing::debug!(?options, "epoch trainer configured");
        Ok(Self { options, ctx })
    }

    fn fit<M: TrainableModel>(&mut self, model: &mut M, loader: &mut M::Loader) -> TrainingResult<RunManifest> {
        let run_id = self.ctx.run_id.clone();
        if loader.is_empty() {
            return Err(TrainingError::Training("data loader yields no batches".to_string()));
        }

        self.emit(ProgressEvent::Started { run_id: run_id.clone() });

        let mut metrics = RunMetrics::default();
        for epoch in 0..self.epochs() {
            let mut loss_sum = 0.0;
            let mut batches = 0u64;
            let mut correct = 0usize;
            let mut seen = 0usize;

            let limit = self.batch_limit().unwrap_or(usize::MAX);
            let epoch_batches: Vec<_> = loader.batches(epoch).take(limit).collect();
            for batch in &epoch_batches {
                if self.options.max_steps.is_some_and(|max| metrics.steps >= max) {
                    break;
                }
                let out = model.training_step(batch)?;
                if !out.loss.is_finite() {
                    return Err(TrainingError::Training(format!(
                        "loss is not finite at step {}",
                        metrics.steps + 1
                    )));
                }
                metrics.steps += 1;
                batches += 1;
                loss_sum += out.loss;
                correct += out.correct;
                seen += out.samples;

                let every = self.options.log_every_n_steps;
                if every > 0 && metrics.steps % every == 0 {
                    self.emit(ProgressEvent::Step { run_id: run_id.clone(), step: metrics.steps, loss: out.loss });
                }
            }

            if batches == 0 {
                break;
            }
            let mean_loss = loss_sum / batches as f64;
            let accuracy = if seen == 0 { 0.0 } else { correct as f64 / seen as f64 };
            metrics.epochs += 1;
            metrics.train_loss = Some(mean_loss);
            metrics.train_accuracy = Some(accuracy);
            self.emit(ProgressEvent::EpochEnd { run_id: run_id.clone(), epoch, mean_loss, accuracy });
        }

        let manifest = RunManifest {
            run_id: run_id.clone(),
            created_at: chrono::Utc::now(),
            dataset_id: loader.fingerprint(),
            metrics,
            artifacts: self.collect_artifacts(model)?,
        };
        if let Some(layout) = &self.ctx.layout {
            write_json(layout.manifest_path(&run_id), &manifest)?;
        }

        self.emit(ProgressEvent::Finished { run_id });
        Ok(manifest)
    }
}
