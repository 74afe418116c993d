use std::sync::Arc;

use log::debug;

use crate::data::augment::Augmentation;
use crate::data::batch::BatchSource;
use crate::data::dataset::RadarDataset;
use crate::data::folds::KFold;
use crate::data::loader::DataLoader;
use crate::error::{Result, TrainError};
use crate::network::{Network, NetworkSpec};
use crate::optim::Sgd;
use crate::train::crossval::{FoldRun, FoldSetup};

/// Builds a fresh dense network, SGD optimizer and augmented loaders for each
/// fold of an in-memory radar dataset.
#[derive(Debug, Clone)]
pub struct RadarFoldSetup {
    pub dataset: Arc<RadarDataset>,
    pub kfold: KFold,
    pub network: NetworkSpec,
    pub learning_rate: f64,
    pub momentum: f64,
    pub batch_size: usize,
    pub val_batch_size: usize,
    /// One training source per entry, visited in this order every epoch.
    pub augmentations: Vec<Augmentation>,
    /// Per-epoch shuffle of the training loaders; fold `k` uses `seed + k`.
    pub shuffle_seed: Option<u64>,
    pub drop_last: bool,
}

impl RadarFoldSetup {
    pub fn new(dataset: Arc<RadarDataset>, kfold: KFold) -> Self {
        RadarFoldSetup {
            dataset,
            kfold,
            network: NetworkSpec::default(),
            learning_rate: 0.01,
            momentum: 0.0,
            batch_size: 32,
            val_batch_size: 64,
            augmentations: vec![Augmentation::Identity],
            shuffle_seed: None,
            drop_last: false,
        }
    }
}

impl FoldSetup for RadarFoldSetup {
    type Classifier = Network;
    type Optimizer = Sgd;

    fn build(&mut self, fold: usize) -> Result<FoldRun<Network, Sgd>> {
        if self.augmentations.is_empty() {
            return Err(TrainError::Config("at least one augmentation is required".to_string()));
        }
        let (train_idx, val_idx) = self.kfold.split(fold, self.dataset.len())?;
        debug!("fold {fold}: {} training / {} validation samples", train_idx.len(), val_idx.len());

        let mut train_sources: Vec<Box<dyn BatchSource>> = Vec::with_capacity(self.augmentations.len());
        for (i, &augmentation) in self.augmentations.iter().enumerate() {
            let mut loader = DataLoader::new(
                format!("train[{fold}]/{augmentation:?}"),
                Arc::clone(&self.dataset),
                train_idx.clone(),
                self.batch_size,
            )?
            .drop_last(self.drop_last)
            .with_augmentation(augmentation);
            if let Some(seed) = self.shuffle_seed {
                loader = loader.shuffled(seed.wrapping_add(fold as u64).wrapping_add((i as u64) << 32));
            }
            train_sources.push(Box::new(loader));
        }
        let validation = DataLoader::new(
            format!("val[{fold}]"),
            Arc::clone(&self.dataset),
            val_idx,
            self.val_batch_size,
        )?;

        Ok(FoldRun {
            classifier: self.network.build(self.dataset.shape.features(), fold)?,
            optimizer: Sgd::new(self.learning_rate).with_momentum(self.momentum),
            train_sources,
            validation: Box::new(validation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::RadarRecord;

    fn dataset(n: usize) -> Arc<RadarDataset> {
        let records = (0..n)
            .map(|i| RadarRecord {
                id: format!("s{i}"),
                band_1: vec![i as f64; 4],
                band_2: vec![1.0; 4],
                is_iceberg: Some((i % 2) as u8),
            })
            .collect();
        Arc::new(RadarDataset::from_records(records).unwrap())
    }

    #[test]
    fn test_one_training_source_per_augmentation() {
        let mut setup = RadarFoldSetup::new(dataset(10), KFold::new(5).unwrap());
        setup.batch_size = 3;
        setup.augmentations = vec![Augmentation::Identity, Augmentation::FlipVertical];

        let run = setup.build(1).unwrap();
        assert_eq!(run.train_sources.len(), 2);
        assert_eq!(run.train_sources[0].len(), 3);
        assert_eq!(run.validation.len(), 1);
        assert_eq!(run.classifier.input_size(), 8);
    }

    #[test]
    fn test_folds_get_independent_networks() {
        let mut setup = RadarFoldSetup::new(dataset(6), KFold::new(3).unwrap());
        let a = setup.build(0).unwrap().classifier;
        let b = setup.build(1).unwrap().classifier;
        assert_ne!(a.layers[0].weights, b.layers[0].weights);
    }

    #[test]
    fn test_no_augmentations_is_config_error() {
        let mut setup = RadarFoldSetup::new(dataset(6), KFold::new(3).unwrap());
        setup.augmentations.clear();
        assert!(matches!(setup.build(0), Err(TrainError::Config(_))));
    }
}
