use crate::context::RunId;
use crate::error::{TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Checkpoint,
    ResolvedConfig,
    Overrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunMetrics {
    pub train_loss: Option<f64>,
    pub train_accuracy: Option<f64>,
    pub steps: u64,
    pub epochs: u64,
}

/// Summary written at the end of a run, and what `fit` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    /// Content hash of the training data, when the loader can provide one.
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub metrics: RunMetrics,
    pub artifacts: Vec<TrainingArtifact>,
}

impl RunManifest {
    #[must_use]
    pub fn artifact(&self, kind: &ArtifactKind) -> Option<&TrainingArtifact> {
        self.artifacts.iter().find(|a| &a.kind == kind)
    }
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn make_artifact(kind: ArtifactKind, path: PathBuf) -> TrainingResult<TrainingArtifact> {
    if !path.exists() {
        return Err(TrainingError::Artifact(format!(
            "artifact path does not exist: {}",
            path.display()
        )));
    }

    let hash = sha256_file(&path)?;
    Ok(TrainingArtifact { kind, path, sha256: hash })
}
