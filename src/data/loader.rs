use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::augment::Augmentation;
use crate::data::batch::{Batch, BatchIter, BatchSource};
use crate::data::dataset::RadarDataset;
use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;

/// Batches over a subset of a shared in-memory dataset, seen through one
/// augmentation.
pub struct DataLoader {
    name: String,
    dataset: Arc<RadarDataset>,
    indices: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    augmentation: Augmentation,
    rng: Option<StdRng>,
}

impl DataLoader {
    pub fn new(
        name: impl Into<String>,
        dataset: Arc<RadarDataset>,
        indices: Vec<usize>,
        batch_size: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrainError::Config("batch_size must be at least 1".to_string()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= dataset.len()) {
            return Err(TrainError::Dataset(format!(
                "index {bad} out of range for {} samples",
                dataset.len()
            )));
        }
        Ok(DataLoader {
            name: name.into(),
            dataset,
            indices,
            batch_size,
            drop_last: false,
            augmentation: Augmentation::Identity,
            rng: None,
        })
    }

    /// Reshuffles the sample order at the start of every pass.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Skips a trailing batch smaller than `batch_size`.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        self.augmentation = augmentation;
        self
    }

    fn make_batch(&self, chunk: &[usize]) -> Result<Batch> {
        let shape = self.dataset.shape;
        let rows = chunk.iter()
            .map(|&i| self.augmentation.apply(&self.dataset.images[i], shape))
            .collect();
        let targets = chunk.iter().map(|&i| self.dataset.labels[i]).collect();
        Batch::new(Matrix::from_data(rows), targets, shape)
    }
}

impl BatchSource for DataLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        if self.drop_last {
            self.indices.len() / self.batch_size
        } else {
            self.indices.len().div_ceil(self.batch_size)
        }
    }

    fn batches(&mut self) -> BatchIter<'_> {
        let mut order = self.indices.clone();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        let chunks: Vec<Vec<usize>> = order
            .chunks(self.batch_size)
            .take(self.len())
            .map(<[usize]>::to_vec)
            .collect();
        let this = &*self;
        Box::new(chunks.into_iter().map(move |chunk| this.make_batch(&chunk)))
    }
}
