use crate::error::TrainingResult;
use kiln_config::ConfigSection;

/// An epoch-addressable source of training batches.
pub trait DataLoader {
    type Batch;

    /// Number of batches per epoch.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Batches for one epoch. Loaders that shuffle derive the order from
    /// their seed and `epoch`, so a run is reproducible.
    fn batches(&mut self, epoch: u64) -> Box<dyn Iterator<Item = Self::Batch> + '_>;

    /// Content hash of the underlying data, recorded in the run manifest.
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

/// Construction contract for a trainable model.
///
/// Each associated config type is the decoded form of one section of the
/// resolved configuration.
pub trait Model: Sized {
    type Config: ConfigSection;
    type DataLoaderConfig: ConfigSection;
    type DatasetConfig: ConfigSection;
    type OptimConfig: ConfigSection;
    type Loader: DataLoader;

    fn from_config(config: Self::Config) -> TrainingResult<Self>;

    fn instantiate_dataloader(
        &self,
        loader: &Self::DataLoaderConfig,
        dataset: &Self::DatasetConfig,
    ) -> TrainingResult<Self::Loader>;

    /// Attach an optimizer. Implementations reject a second call with
    /// `TrainingError::Usage`.
    fn setup_optimization(&mut self, optim: &Self::OptimConfig) -> TrainingResult<()>;
}

/// Result of one optimization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub loss: f64,
    pub correct: usize,
    pub samples: usize,
}

/// What a training driver needs from a model once it is constructed.
pub trait TrainableModel: Model {
    fn training_step(&mut self, batch: &<Self::Loader as DataLoader>::Batch) -> TrainingResult<StepOutput>;

    /// Serializable snapshot of the learned parameters.
    fn checkpoint(&self) -> TrainingResult<serde_json::Value>;
}
