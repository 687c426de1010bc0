//! Reference collaborators: a hashed n-gram text classifier trained by an
//! epoch loop.

pub mod classifier;
pub mod config;
pub mod epoch_trainer;
pub mod features;
pub mod loader;
pub mod optim;

pub use classifier::TextClassifier;
pub use config::{ClassifierConfig, DatasetConfig, LoaderConfig, OptimConfig, OptimizerKind, TrainerOptions};
pub use epoch_trainer::EpochTrainer;
pub use loader::{Batch, BatchLoader};
