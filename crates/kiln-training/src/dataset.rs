use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Stable identifier for a dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One text sample with its class label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub label: String,
}

/// Read `{text_field, label_field}` pairs from a JSONL file.
///
/// Blank lines are skipped. Both fields must be strings. Reading stops after
/// `max_samples` examples when a limit is given.
pub fn read_jsonl_examples(
    path: &Path,
    text_field: &str,
    label_field: &str,
    max_samples: Option<usize>,
) -> TrainingResult<Vec<LabeledExample>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| TrainingError::Dataset(format!("failed to read {}: {e}", path.display())))?;
    let mut examples = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if max_samples.is_some_and(|max| examples.len() >= max) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            TrainingError::Dataset(format!("failed to parse jsonl line {}: {}", idx + 1, e))
        })?;
        let field = |name: &str| -> TrainingResult<String> {
            record.get(name).and_then(serde_json::Value::as_str).map(str::to_string).ok_or_else(|| {
                TrainingError::Dataset(format!("line {}: missing string field `{name}`", idx + 1))
            })
        };
        examples.push(LabeledExample { text: field(text_field)?, label: field(label_field)? });
    }

    Ok(examples)
}

pub fn compute_dataset_id(examples: &[LabeledExample]) -> TrainingResult<DatasetId> {
    let mut hasher = Sha256::new();

    for ex in examples {
        let bytes = serde_json::to_vec(ex)?;
        hasher.update(bytes);
        hasher.update(b"\n");
    }

    Ok(DatasetId(hex::encode(hasher.finalize())))
}

pub fn validate_examples(examples: &[LabeledExample]) -> TrainingResult<()> {
    if examples.is_empty() {
        return Err(TrainingError::Dataset("dataset must not be empty".to_string()));
    }
    for (idx, ex) in examples.iter().enumerate() {
        if ex.text.trim().is_empty() {
            return Err(TrainingError::Dataset(format!("example[{idx}] text is empty")));
        }
        if ex.label.trim().is_empty() {
            return Err(TrainingError::Dataset(format!("example[{idx}] label is empty")));
        }
    }
    Ok(())
}
