use super::config::{ClassifierConfig, DatasetConfig, LoaderConfig, OptimConfig};
use super::features::{FeatureHasher, SparseFeatures};
use super::loader::{Batch, BatchLoader, EncodedExample};
use super::optim::{build_optimizer, Optimizer};
use kiln_training::{
    compute_dataset_id, read_jsonl_examples, validate_examples, Model, StepOutput, TrainableModel, TrainingError,
    TrainingResult,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Upper bound on `labels * (hashing_dim + 1)`; params and grads are each this many f64s.
pub const MAX_PARAMETERS: usize = 1 << 26;

/// Multinomial logistic regression over hashed n-gram features.
///
/// Parameters live in one flat buffer: `labels.len() * dim` weights
/// (row-major by class) followed by one bias per class.
pub struct TextClassifier {
    labels: Vec<String>,
    hasher: FeatureHasher,
    params: Vec<f64>,
    grads: Vec<f64>,
    optimizer: Option<Box<dyn Optimizer>>,
}

#[derive(Serialize)]
struct Checkpoint<'a> {
    labels: &'a [String],
    hashing_dim: usize,
    weights: &'a [f64],
    biases: &'a [f64],
}

impl TextClassifier {
    fn num_classes(&self) -> usize {
        self.labels.len()
    }

    fn dim(&self) -> usize {
        self.hasher.dim()
    }

    fn bias_offset(&self) -> usize {
        self.num_classes() * self.dim()
    }

    fn logits(&self, features: &SparseFeatures) -> Vec<f64> {
        let dim = self.dim();
        let biases = &self.params[self.bias_offset()..];
        (0..self.num_classes())
            .map(|c| biases[c] + features.iter().map(|&(i, x)| self.params[c * dim + i] * x).sum::<f64>())
            .collect()
    }

    fn softmax(logits: &[f64]) -> Vec<f64> {
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    /// Most likely label for `text`.
    #[must_use]
    pub fn predict(&self, text: &str) -> &str {
        let logits = self.logits(&self.hasher.featurize(text));
        &self.labels[Self::argmax(&logits)]
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Model for TextClassifier {
    type Config = ClassifierConfig;
    type DataLoaderConfig = LoaderConfig;
    type DatasetConfig = DatasetConfig;
    type OptimConfig = OptimConfig;
    type Loader = BatchLoader;

    fn from_config(config: ClassifierConfig) -> TrainingResult<Self> {
        if config.labels.is_empty() {
            return Err(TrainingError::ModelConstruction("model.labels must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = config.labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(TrainingError::ModelConstruction(format!("duplicate label `{dup}`")));
        }
        if config.hashing_dim == 0 {
            return Err(TrainingError::ModelConstruction("model.hashing_dim must be positive".to_string()));
        }
        if config.max_ngram == 0 {
            return Err(TrainingError::ModelConstruction("model.max_ngram must be at least 1".to_string()));
        }

        let size = config
            .hashing_dim
            .checked_add(1)
            .and_then(|row| row.checked_mul(config.labels.len()))
            .filter(|&size| size <= MAX_PARAMETERS)
            .ok_or_else(|| {
                TrainingError::ModelConstruction(format!(
                    "{} labels with model.hashing_dim = {} exceed the limit of {MAX_PARAMETERS} parameters",
                    config.labels.len(),
                    config.hashing_dim
                ))
            })?;
        tracing::info!(classes = config.labels.len(), parameters = size, "text classifier constructed");
        Ok(Self {
            hasher: FeatureHasher::new(config.hashing_dim, config.lowercase, config.max_ngram),
            labels: config.labels,
            params: vec![0.0; size],
            grads: vec![0.0; size],
            optimizer: None,
        })
    }

    fn instantiate_dataloader(&self, loader: &LoaderConfig, dataset: &DatasetConfig) -> TrainingResult<BatchLoader> {
        let construction = |e: TrainingError| TrainingError::DataLoaderConstruction(e.to_string());

        if loader.batch_size == 0 {
            return Err(TrainingError::DataLoaderConstruction("dataloader.batch_size must be positive".to_string()));
        }

        let examples =
            read_jsonl_examples(&dataset.path, &dataset.text_field, &dataset.label_field, dataset.max_samples)
                .map_err(construction)?;
        validate_examples(&examples).map_err(construction)?;
        let dataset_id = compute_dataset_id(&examples).map_err(construction)?;

        let index: HashMap<&str, usize> = self.labels.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();
        let mut encoded = Vec::with_capacity(examples.len());
        let mut skipped = 0usize;
        for (idx, ex) in examples.iter().enumerate() {
            match index.get(ex.label.as_str()) {
                Some(&label) => encoded.push(EncodedExample { features: self.hasher.featurize(&ex.text), label }),
                None if dataset.skip_unknown_labels => skipped += 1,
                None => {
                    return Err(TrainingError::DataLoaderConstruction(format!(
                        "example[{idx}] has label `{}` not listed in model.labels",
                        ex.label
                    )));
                }
            }
        }
        if encoded.is_empty() {
            return Err(TrainingError::DataLoaderConstruction(format!(
                "no usable examples in {}",
                dataset.path.display()
            )));
        }

        tracing::info!(
            path = %dataset.path.display(),
            examples = encoded.len(),
            skipped,
            dataset_id = %dataset_id,
            "training data loaded"
        );
        Ok(BatchLoader::new(encoded, loader.batch_size, loader.shuffle, loader.drop_last, loader.seed)
            .with_fingerprint(dataset_id.0))
    }

    fn setup_optimization(&mut self, optim: &OptimConfig) -> TrainingResult<()> {
        if self.optimizer.is_some() {
            return Err(TrainingError::Usage("setup_optimization called more than once".to_string()));
        }
        let optimizer = build_optimizer(optim)?;
        tracing::info!(lr = optimizer.lr(), "optimizer attached");
        self.optimizer = Some(optimizer);
        Ok(())
    }
}

impl TrainableModel for TextClassifier {
    fn training_step(&mut self, batch: &Batch) -> TrainingResult<StepOutput> {
        if self.optimizer.is_none() {
            return Err(TrainingError::Usage("training_step called before setup_optimization".to_string()));
        }
        if batch.is_empty() {
            return Err(TrainingError::Training("empty batch".to_string()));
        }

        let dim = self.dim();
        let bias_offset = self.bias_offset();
        let scale = 1.0 / batch.len() as f64;
        self.grads.iter_mut().for_each(|g| *g = 0.0);

        let mut loss = 0.0;
        let mut correct = 0;
        for ex in &batch.examples {
            let probs = Self::softmax(&self.logits(&ex.features));
            loss -= probs[ex.label].max(f64::MIN_POSITIVE).ln();
            if Self::argmax(&probs) == ex.label {
                correct += 1;
            }
            for (c, p) in probs.iter().enumerate() {
                let delta = (p - if c == ex.label { 1.0 } else { 0.0 }) * scale;
                for &(i, x) in &ex.features {
                    self.grads[c * dim + i] += delta * x;
                }
                self.grads[bias_offset + c] += delta;
            }
        }

        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.step(&mut self.params, &self.grads);
        }
        Ok(StepOutput { loss: loss * scale, correct, samples: batch.len() })
    }

    fn checkpoint(&self) -> TrainingResult<serde_json::Value> {
        let offset = self.bias_offset();
        let checkpoint = Checkpoint {
            labels: &self.labels,
            hashing_dim: self.dim(),
            weights: &self.params[..offset],
            biases: &self.params[offset..],
        };
        Ok(serde_json::to_value(checkpoint)?)
    }
}
