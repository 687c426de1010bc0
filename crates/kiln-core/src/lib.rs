//! Kiln Core
//!
//! Concrete collaborators for the kiln training bootstrap. The text
//! classifier and epoch trainer implement the `kiln-training` contracts and
//! register their configuration sections with `kiln-config`.

pub mod training;

pub use training::{EpochTrainer, TextClassifier};

use kiln_config::{ConfigResult, Schema};

/// Root schema of the default application.
pub fn default_schema() -> ConfigResult<Schema> {
    kiln_training::app_schema::<TextClassifier, EpochTrainer>()
}
