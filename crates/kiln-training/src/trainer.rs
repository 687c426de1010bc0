use crate::artifacts::RunManifest;
use crate::context::RunContext;
use crate::error::TrainingResult;
use crate::model::TrainableModel;
use kiln_config::ConfigSection;

/// A training-loop driver.
///
/// `Options` is the decoded `trainer` section; every schema field maps to
/// one named option.
pub trait TrainingDriver: Sized {
    type Options: ConfigSection;

    fn from_options(options: Self::Options, ctx: RunContext) -> TrainingResult<Self>;

    /// Run training to completion.
    fn fit<M: TrainableModel>(&mut self, model: &mut M, loader: &mut M::Loader) -> TrainingResult<RunManifest>;
}
