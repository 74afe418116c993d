use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, TrainError};

/// K-fold splitter: each fold validates on one contiguous slice of the
/// (optionally shuffled) sample order and trains on the rest.
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    /// Shuffle seed; `None` keeps the original order.
    pub seed: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(TrainError::Config(format!("n_splits must be at least 2, got {n_splits}")));
        }
        Ok(KFold { n_splits, seed: None })
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// (train_indices, validation_indices) for `fold`. The first
    /// `n_samples % n_splits` folds get one extra validation sample.
    pub fn split(&self, fold: usize, n_samples: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        if fold >= self.n_splits {
            return Err(TrainError::Config(format!(
                "fold {fold} is out of range [0, {})",
                self.n_splits
            )));
        }
        if n_samples < self.n_splits {
            return Err(TrainError::Dataset(format!(
                "{n_samples} samples cannot be split into {} folds",
                self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.seed {
            indices.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;
        let start = fold * base + fold.min(remainder);
        let end = start + base + usize::from(fold < remainder);

        let validation = indices[start..end].to_vec();
        let mut train = Vec::with_capacity(n_samples - validation.len());
        train.extend_from_slice(&indices[..start]);
        train.extend_from_slice(&indices[end..]);
        Ok((train, validation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_samples() {
        let kf = KFold::new(3).unwrap().with_shuffle(42);
        let mut seen = Vec::new();
        for fold in 0..3 {
            let (train, val) = kf.split(fold, 10).unwrap();
            assert_eq!(train.len() + val.len(), 10);
            assert!(val.iter().all(|i| !train.contains(i)));
            seen.extend(val);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_remainder_goes_to_first_folds() {
        let kf = KFold::new(3).unwrap();
        let sizes: Vec<usize> = (0..3).map(|f| kf.split(f, 10).unwrap().1.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(kf.split(0, 10).unwrap().1, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(KFold::new(1).is_err());
        assert!(KFold::new(2).unwrap().split(2, 10).is_err());
        assert!(KFold::new(5).unwrap().split(0, 3).is_err());
    }
}
