use super::features::SparseFeatures;
use kiln_training::DataLoader;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One featurized example with its label index.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExample {
    pub features: SparseFeatures,
    pub label: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub examples: Vec<EncodedExample>,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// In-memory loader. With `shuffle`, each epoch is reordered by an RNG
/// seeded from `seed + epoch`.
#[derive(Debug)]
pub struct BatchLoader {
    examples: Vec<EncodedExample>,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    seed: u64,
    fingerprint: Option<String>,
}

impl BatchLoader {
    /// `batch_size` must be non-zero.
    #[must_use]
    pub fn new(examples: Vec<EncodedExample>, batch_size: usize, shuffle: bool, drop_last: bool, seed: u64) -> Self {
        Self { examples, batch_size: batch_size.max(1), shuffle, drop_last, seed, fingerprint: None }
    }

    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    #[must_use]
    pub fn num_examples(&self) -> usize {
        self.examples.len()
    }

    fn order(&self, epoch: u64) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.examples.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch));
            order.shuffle(&mut rng);
        }
        order
    }
}

impl DataLoader for BatchLoader {
    type Batch = Batch;

    fn len(&self) -> usize {
        let n = self.examples.len();
        if self.drop_last { n / self.batch_size } else { n.div_ceil(self.batch_size) }
    }

    fn batches(&mut self, epoch: u64) -> Box<dyn Iterator<Item = Batch> + '_> {
        let order = self.order(epoch);
        let batch_size = self.batch_size;
        let drop_last = self.drop_last;
        let examples = &self.examples;

        let chunks: Vec<Vec<usize>> = order
            .chunks(batch_size)
            .filter(|chunk| !drop_last || chunk.len() == batch_size)
            .map(<[usize]>::to_vec)
            .collect();

        Box::new(chunks.into_iter().map(move |chunk| Batch {
            examples: chunk.into_iter().map(|i| examples[i].clone()).collect(),
        }))
    }

    fn fingerprint(&self) -> Option<String> {
        self.fingerprint.clone()
    }
}
