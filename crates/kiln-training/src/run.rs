use crate::artifacts::RunManifest;
use crate::bootstrap::Bootstrapped;
use crate::error::TrainingResult;
use crate::model::TrainableModel;
use crate::trainer::TrainingDriver;

/// Hand control to the trainer. `fit` is called exactly once and its
/// failure is returned as is.
pub fn run<M, T>(bootstrapped: Bootstrapped<M, T>) -> TrainingResult<RunManifest>
where
    M: TrainableModel,
    T: TrainingDriver,
{
    let Bootstrapped { mut model, mut loader, mut trainer } = bootstrapped;
    let manifest = trainer.fit(&mut model, &mut loader)?;
    tracing::info!(
        run_id = %manifest.run_id,
        steps = manifest.metrics.steps,
        epochs = manifest.metrics.epochs,
        "run complete"
    );
    Ok(manifest)
}
