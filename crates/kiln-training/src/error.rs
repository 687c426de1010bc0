use kiln_config::ConfigError;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("model construction failed: {0}")]
    ModelConstruction(String),

    #[error("data loader construction failed: {0}")]
    DataLoaderConstruction(String),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
