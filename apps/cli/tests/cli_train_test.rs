use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Temp workspace with the sample `conf/` and `data/` directories.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    for (dir, file) in [("conf", "text_classifier_training.toml"), ("data", "questions.jsonl")] {
        std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        std::fs::copy(repo_root().join(dir).join(file), temp.path().join(dir).join(file)).unwrap();
    }
    temp
}

fn kiln(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kiln-cli").unwrap();
    cmd.current_dir(dir).env_remove("KILN_SEED");
    cmd
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("kiln-cli").unwrap();
    cmd.arg("--help").assert().success().stdout(predicate::str::contains("schema-validated"));
}

#[test]
fn test_train_writes_run_directory() {
    let temp = workspace();

    kiln(temp.path())
        .args(["train", "--output-dir", "out", "trainer.max_epochs=2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Training complete"));

    let runs: Vec<_> = std::fs::read_dir(temp.path().join("out")).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(runs.len(), 1);
    let run_dir = &runs[0];
    assert!(run_dir.join("run_manifest.json").exists());
    assert!(run_dir.join("checkpoints/model.json").exists());

    let resolved = std::fs::read_to_string(run_dir.join("config.toml")).unwrap();
    assert!(resolved.contains("max_epochs = 2"));
    assert!(resolved.contains("seed = 42"));
    let overrides = std::fs::read_to_string(run_dir.join("overrides.json")).unwrap();
    assert!(overrides.contains("trainer.max_epochs=2"));
}

#[test]
fn test_train_json_prints_manifest() {
    let temp = workspace();

    let output = kiln(temp.path())
        .args(["--log-level", "error", "train", "--json", "--output-dir", "out", "trainer.max_epochs=1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(manifest["metrics"]["epochs"], 1);
    assert!(manifest["dataset_id"].is_string());
}

#[test]
fn test_unknown_field_fails_naming_path() {
    let temp = workspace();

    kiln(temp.path())
        .args(["train", "--output-dir", "out", "model.unknown_field=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model.unknown_field"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_settings_logged_before_construction_failure() {
    let temp = workspace();

    let output = kiln(temp.path())
        .args(["train", "--output-dir", "out", "train_dataset.path=absent.jsonl"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let settings = stderr.find("Application settings").expect("settings not logged");
    let trainer = stderr.find("[trainer]").expect("trainer section not logged");
    let failure = stderr.find("Failed to set up training").expect("no fatal error");
    assert!(settings < trainer && trainer < failure, "{stderr}");
    assert!(stderr.contains("absent.jsonl"));
}

#[test]
fn test_wrong_type_fails() {
    let temp = workspace();

    kiln(temp.path())
        .args(["train", "trainer.max_epochs=many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trainer.max_epochs"));
}

#[test]
fn test_missing_required_field_without_config_file() {
    let temp = TempDir::new().unwrap();

    kiln(temp.path())
        .args(["train", "train_dataset.path=data.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model.labels"));
}

#[test]
fn test_explicit_config_name_must_exist() {
    let temp = workspace();

    kiln(temp.path())
        .args(["config", "show", "--config-name", "absent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration `absent` not found"));
}

#[test]
fn test_config_show_coerces_overrides() {
    let temp = workspace();

    kiln(temp.path())
        .args(["config", "show", "trainer.max_epochs=\"50\"", "optim.lr=0.01", "optim.lr=0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_epochs = 50"))
        .stdout(predicate::str::contains("lr = 0.2"));
}

#[test]
fn test_config_show_json() {
    let temp = workspace();

    let output = kiln(temp.path()).args(["config", "show", "--json"]).output().unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["dataloader"]["batch_size"], 8);
    assert_eq!(config["optim"]["name"], "adam");
}

#[test]
fn test_config_schema_lists_fields() {
    let temp = TempDir::new().unwrap();

    kiln(temp.path())
        .args(["config", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("train_dataset.path: path (required)"))
        .stdout(predicate::str::contains("trainer.max_epochs: integer = 10"));
}

#[test]
fn test_runs_list_after_training() {
    let temp = workspace();

    kiln(temp.path()).args(["train", "--output-dir", "out", "trainer.fast_dev_run=true"]).assert().success();

    let output = kiln(temp.path()).args(["runs", "list", "--json", "--output-dir", "out"]).output().unwrap();
    assert!(output.status.success());
    let runs: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["metrics"]["steps"], 1);
}

#[test]
fn test_runs_list_empty() {
    let temp = TempDir::new().unwrap();

    kiln(temp.path())
        .args(["runs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No finished runs"));
}
