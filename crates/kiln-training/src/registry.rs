use crate::artifacts::{ArtifactKind, RunManifest};
use crate::error::TrainingResult;
use crate::layout::RunLayout;
use std::path::{Path, PathBuf};

/// A finished run discovered on disk.
#[derive(Debug, Clone)]
pub struct RunEntry {
    pub run_dir: PathBuf,
    pub checkpoint_path: Option<PathBuf>,
    pub manifest: RunManifest,
}

fn read_manifest(path: &Path) -> TrainingResult<RunManifest> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice::<RunManifest>(&bytes)?)
}

/// Discover runs by scanning `<output_dir>/*/run_manifest.json`, oldest first.
///
/// Directories without a manifest (runs that failed before finishing) are skipped.
pub fn discover_runs(output_dir: &Path) -> TrainingResult<Vec<RunEntry>> {
    let layout = RunLayout::new(output_dir.to_path_buf());
    let mut out = Vec::new();

    let dir = match std::fs::read_dir(layout.root()) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };

    for entry in dir {
        let entry = entry?;
        let run_dir = entry.path();
        if !run_dir.is_dir() {
            continue;
        }
        let manifest_path = run_dir.join("run_manifest.json");
        if !manifest_path.exists() {
            tracing::debug!(dir = %run_dir.display(), "skipping run without manifest");
            continue;
        }
        let manifest = match read_manifest(&manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(path = %manifest_path.display(), error = %err, "skipping unreadable run manifest");
                continue;
            }
        };
        let checkpoint_path = manifest.artifact(&ArtifactKind::Checkpoint).map(|a| a.path.clone());

        out.push(RunEntry { run_dir, checkpoint_path, manifest });
    }

    out.sort_by(|a, b| a.manifest.created_at.cmp(&b.manifest.created_at));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{RunMetrics, TrainingArtifact};
    use crate::context::RunId;
    use tempfile::TempDir;

    fn write_manifest(layout: &RunLayout, id: &str, with_checkpoint: bool) {
        let run_id = RunId(id.to_string());
        layout.ensure_run_dirs(&run_id).unwrap();
        let artifacts = if with_checkpoint {
            vec![TrainingArtifact {
                kind: ArtifactKind::Checkpoint,
                path: layout.checkpoints_dir(&run_id).join("model.json"),
                sha256: "00".to_string(),
            }]
        } else {
            vec![]
        };
        let manifest = RunManifest {
            run_id: run_id.clone(),
            created_at: chrono::Utc::now(),
            dataset_id: None,
            metrics: RunMetrics::default(),
            artifacts,
        };
        std::fs::write(layout.manifest_path(&run_id), serde_json::to_string(&manifest).unwrap()).unwrap();
    }

    #[test]
    fn test_discover_runs_skips_incomplete_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        write_manifest(&layout, "a", true);
        write_manifest(&layout, "b", false);
        std::fs::create_dir_all(temp.path().join("crashed")).unwrap();

        let runs = discover_runs(temp.path()).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().any(|r| r.manifest.run_id.0 == "a" && r.checkpoint_path.is_some()));
        assert!(runs.iter().any(|r| r.manifest.run_id.0 == "b" && r.checkpoint_path.is_none()));
    }

    #[test]
    fn test_discover_runs_skips_corrupt_manifest() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        write_manifest(&layout, "good", true);
        let half_written = RunId("half".to_string());
        layout.ensure_run_dirs(&half_written).unwrap();
        std::fs::write(layout.manifest_path(&half_written), "{\"run_id\": \"ha").unwrap();

        let runs = discover_runs(temp.path()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].manifest.run_id.0, "good");
    }

    #[test]
    fn test_discover_runs_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(discover_runs(&temp.path().join("outputs")).unwrap().is_empty());
    }
}
