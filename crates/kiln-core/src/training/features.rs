//! Hashed bag-of-n-grams text features.

use std::collections::BTreeMap;

/// Sparse feature vector: `(bucket, weight)` pairs sorted by bucket.
pub type SparseFeatures = Vec<(usize, f64)>;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0100_0000_01b3);
    }
    h
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureHasher {
    dim: usize,
    lowercase: bool,
    max_ngram: usize,
}

impl FeatureHasher {
    #[must_use]
    pub fn new(dim: usize, lowercase: bool, max_ngram: usize) -> Self {
        Self { dim, lowercase, max_ngram }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| if self.lowercase { t.to_lowercase() } else { t.to_string() })
            .collect()
    }

    /// Term counts of all word n-grams up to `max_ngram`, L2-normalized.
    #[must_use]
    pub fn featurize(&self, text: &str) -> SparseFeatures {
        let tokens = self.tokens(text);
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();

        for n in 1..=self.max_ngram {
            for gram in tokens.windows(n) {
                let bucket = usize::try_from(fnv1a(gram.join(" ").as_bytes()) % self.dim as u64).unwrap_or(0);
                *counts.entry(bucket).or_default() += 1.0;
            }
        }

        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            counts.values_mut().for_each(|v| *v /= norm);
        }
        counts.into_iter().collect()
    }
}
