//! Section names of the application schema.

use crate::model::Model;
use crate::trainer::TrainingDriver;
use kiln_config::{ConfigResult, Schema, SchemaRegistry};

pub const MODEL: &str = "model";
pub const DATALOADER: &str = "dataloader";
pub const TRAIN_DATASET: &str = "train_dataset";
pub const OPTIM: &str = "optim";
pub const TRAINER: &str = "trainer";

/// Root schema for a model/driver pair, one section per collaborator.
pub fn app_schema<M: Model, T: TrainingDriver>() -> ConfigResult<Schema> {
    SchemaRegistry::new("app")
        .register::<M::Config>(MODEL)
        .register::<M::DataLoaderConfig>(DATALOADER)
        .register::<M::DatasetConfig>(TRAIN_DATASET)
        .register::<M::OptimConfig>(OPTIM)
        .register::<T::Options>(TRAINER)
        .build()
}
