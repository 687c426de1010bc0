//! Configuration sections of the reference text classifier.

use kiln_config::{ConfigResult, ConfigSection, FieldType, Schema};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Output classes, in logit order.
    pub labels: Vec<String>,
    pub hashing_dim: usize,
    pub lowercase: bool,
    pub max_ngram: usize,
}

impl ConfigSection for ClassifierConfig {
    fn schema() -> ConfigResult<Schema> {
        Schema::builder("model")
            .required("labels", FieldType::list(FieldType::String))
            .help("class names predicted by the classifier")
            .field("hashing_dim", FieldType::Integer, 4096)
            .help("number of hashed feature buckets")
            .field("lowercase", FieldType::Bool, true)
            .field("max_ngram", FieldType::Integer, 1)
            .help("longest word n-gram hashed into features")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub text_field: String,
    pub label_field: String,
    pub max_samples: Option<usize>,
    /// Drop examples whose label is not in `model.labels` instead of failing.
    pub skip_unknown_labels: bool,
}

impl ConfigSection for DatasetConfig {
    fn schema() -> ConfigResult<Schema> {
        Schema::builder("train_dataset")
            .required("path", FieldType::Path)
            .help("JSONL file with one example per line")
            .field("text_field", FieldType::String, "question")
            .field("label_field", FieldType::String, "question_type")
            .optional("max_samples", FieldType::Integer)
            .field("skip_unknown_labels", FieldType::Bool, false)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub shuffle: bool,
    pub drop_last: bool,
    pub seed: u64,
}

impl ConfigSection for LoaderConfig {
    fn schema() -> ConfigResult<Schema> {
        Schema::builder("dataloader")
            .field("batch_size", FieldType::Integer, 32)
            .field("shuffle", FieldType::Bool, true)
            .field("drop_last", FieldType::Bool, false)
            .field("seed", FieldType::Integer, 42)
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    AdamW,
    Sgd,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimConfig {
    pub name: OptimizerKind,
    pub lr: f64,
    pub betas: Vec<f64>,
    pub eps: f64,
    pub weight_decay: f64,
    pub momentum: f64,
}

impl ConfigSection for OptimConfig {
    fn schema() -> ConfigResult<Schema> {
        Schema::builder("optim")
            .field("name", FieldType::enumeration(["adam", "adamw", "sgd"]), "adam")
            .field("lr", FieldType::Float, 0.001)
            .field("betas", FieldType::list(FieldType::Float), vec![0.9, 0.999])
            .help("Adam moment decay rates")
            .field("eps", FieldType::Float, 1e-8)
            .field("weight_decay", FieldType::Float, 0.0)
            .field("momentum", FieldType::Float, 0.0)
            .help("SGD only")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerOptions {
    pub max_epochs: u64,
    pub max_steps: Option<u64>,
    pub log_every_n_steps: u64,
    pub enable_checkpointing: bool,
    /// Run a single batch of a single epoch.
    pub fast_dev_run: bool,
    pub limit_train_batches: Option<usize>,
}

impl ConfigSection for TrainerOptions {
    fn schema() -> ConfigResult<Schema> {
        Schema::builder("trainer")
            .field("max_epochs", FieldType::Integer, 10)
            .optional("max_steps", FieldType::Integer)
            .help("stop after this many optimizer steps")
            .field("log_every_n_steps", FieldType::Integer, 50)
            .field("enable_checkpointing", FieldType::Bool, true)
            .field("fast_dev_run", FieldType::Bool, false)
            .optional("limit_train_batches", FieldType::Integer)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{EpochTrainer, TextClassifier};
    use kiln_config::{resolve, ConfigError, OverrideSource};
    use kiln_training::app_schema;

    fn resolve_with(args: &[&str]) -> Result<kiln_config::ResolvedConfig, ConfigError> {
        let schema = app_schema::<TextClassifier, EpochTrainer>()?;
        resolve(&schema, &OverrideSource::new().with_cli_args(args)?)
    }

    #[test]
    fn test_defaults_decode_into_sections() {
        let config = resolve_with(&["model.labels=[count, exist]", "train_dataset.path=q.jsonl"]).unwrap();

        let model: ClassifierConfig = config.section("model").unwrap();
        assert_eq!(model.labels, vec!["count", "exist"]);
        assert_eq!(model.hashing_dim, 4096);

        let optim: OptimConfig = config.section("optim").unwrap();
        assert_eq!(optim.name, OptimizerKind::Adam);
        assert_eq!(optim.betas, vec![0.9, 0.999]);

        let trainer: TrainerOptions = config.section("trainer").unwrap();
        assert_eq!(trainer.max_epochs, 10);
        assert_eq!(trainer.max_steps, None);

        let dataset: DatasetConfig = config.section("train_dataset").unwrap();
        assert_eq!(dataset.text_field, "question");
        assert_eq!(dataset.max_samples, None);
    }

    #[test]
    fn test_trainer_max_epochs_string_becomes_integer() {
        let config =
            resolve_with(&["model.labels=[a]", "train_dataset.path=q.jsonl", "trainer.max_epochs=\"50\""]).unwrap();
        let trainer: TrainerOptions = config.section("trainer").unwrap();
        assert_eq!(trainer.max_epochs, 50);
    }

    #[test]
    fn test_optimizer_name_outside_enum_is_rejected() {
        let err = resolve_with(&["model.labels=[a]", "train_dataset.path=q.jsonl", "optim.name=lbfgs"]).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { ref path, .. } if path == "optim.name"));
    }

    #[test]
    fn test_labels_are_required() {
        let err = resolve_with(&["train_dataset.path=q.jsonl"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField { ref path } if path == "model.labels"));
    }
}
