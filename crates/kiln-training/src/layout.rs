use crate::context::RunId;
use crate::error::TrainingResult;
use kiln_config::ResolvedConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Filesystem layout for run outputs: `<root>/<run_id>/...`.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join(run_id.0.as_str())
    }

    #[must_use]
    pub fn manifest_path(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join("run_manifest.json")
    }

    #[must_use]
    pub fn resolved_config_path(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join("config.toml")
    }

    #[must_use]
    pub fn overrides_path(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join("overrides.json")
    }

    #[must_use]
    pub fn checkpoints_dir(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join("checkpoints")
    }

    pub fn ensure_run_dirs(&self, run_id: &RunId) -> TrainingResult<()> {
        std::fs::create_dir_all(self.checkpoints_dir(run_id))?;
        Ok(())
    }

    /// Persist the effective configuration and the raw CLI overrides so the
    /// run can be reproduced from its directory alone.
    pub fn record_inputs(&self, run_id: &RunId, config: &ResolvedConfig, overrides: &[String]) -> TrainingResult<()> {
        self.ensure_run_dirs(run_id)?;
        std::fs::write(self.resolved_config_path(run_id), config.to_toml_string()?)?;
        std::fs::write(self.overrides_path(run_id), serde_json::to_string_pretty(overrides)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::{resolve, FieldType, OverrideSource, Schema};
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().join(DEFAULT_OUTPUT_DIR));
        let id = RunId("run-1".to_string());

        assert!(layout.run_dir(&id).ends_with("outputs/run-1"));
        assert!(layout.manifest_path(&id).ends_with("run-1/run_manifest.json"));
    }

    #[test]
    fn test_record_inputs_writes_config_and_overrides() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        let id = RunId("run-2".to_string());

        let trainer = Schema::builder("trainer").field("max_epochs", FieldType::Integer, 10).build().unwrap();
        let schema = Schema::builder("app").section("trainer", trainer).build().unwrap();
        let config = resolve(&schema, &OverrideSource::new()).unwrap();

        layout.record_inputs(&id, &config, &["trainer.max_epochs=10".to_string()]).unwrap();

        let written = std::fs::read_to_string(layout.resolved_config_path(&id)).unwrap();
        assert!(written.contains("max_epochs = 10"));
        let overrides: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(layout.overrides_path(&id)).unwrap()).unwrap();
        assert_eq!(overrides, vec!["trainer.max_epochs=10"]);
        assert!(layout.checkpoints_dir(&id).is_dir());
    }
}
