//! Kiln Training
//!
//! Construction contracts and run plumbing for config-driven training:
//! - Collaborator traits (`Model`, `DataLoader`, `TrainingDriver`)
//! - The bootstrap sequence model -> data loader -> optimizer -> trainer
//! - Run directories, manifests and artifact hashing

pub mod artifacts;
pub mod bootstrap;
pub mod context;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod model;
pub mod progress;
pub mod registry;
pub mod run;
pub mod sections;
pub mod trainer;

pub use artifacts::{make_artifact, sha256_file, ArtifactKind, RunManifest, RunMetrics, TrainingArtifact};
pub use bootstrap::{bootstrap, Bootstrapped};
pub use context::{RunContext, RunId};
pub use dataset::{compute_dataset_id, read_jsonl_examples, validate_examples, DatasetId, LabeledExample};
pub use error::{TrainingError, TrainingResult};
pub use layout::{RunLayout, DEFAULT_OUTPUT_DIR};
pub use model::{DataLoader, Model, StepOutput, TrainableModel};
pub use progress::{ProgressEvent, ProgressSink, StdoutProgressSink, TracingProgressSink};
pub use registry::{discover_runs, RunEntry};
pub use run::run;
pub use sections::app_schema;
pub use trainer::TrainingDriver;
