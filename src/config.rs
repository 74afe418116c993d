//! TOML configuration for the `iceberg-cv` binary.

use std::ops::Range;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::data::augment::Augmentation;
use crate::error::{Result, TrainError};
use crate::loss::LossType;
use crate::network::NetworkSpec;

/// Application configuration loaded from a TOML file. Missing sections and
/// fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub cross_validation: CrossValidationConfig,
    pub training: TrainingConfig,
    pub model: NetworkSpec,
    pub checkpoint: CheckpointConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON array of labelled radar records.
    pub train_path: String,
    /// Standardise each band over the whole dataset before splitting.
    pub standardize: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub n_splits: usize,
    /// First fold to run.
    pub start_fold: usize,
    /// One past the last fold to run; `n_splits` when absent.
    pub end_fold: Option<usize>,
    /// Shuffles samples before splitting when set.
    pub shuffle_seed: Option<u64>,
    /// Record a failing fold and carry on instead of aborting.
    pub isolate_failures: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub val_batch_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub loss: LossType,
    /// Training views per epoch, in order.
    pub augmentations: Vec<Augmentation>,
    /// Per-epoch reshuffle seed for the training loaders.
    pub shuffle_seed: Option<u64>,
    pub drop_last: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub dir: String,
    pub prefix: String,
    pub extension: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also append every metrics record to this JSON-lines file.
    pub metrics_path: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            train_path: "data/train.json".to_string(),
            standardize: true,
        }
    }
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        CrossValidationConfig {
            n_splits: 5,
            start_fold: 0,
            end_fold: None,
            shuffle_seed: Some(42),
            isolate_failures: false,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 20,
            batch_size: 32,
            val_batch_size: 64,
            learning_rate: 0.01,
            momentum: 0.9,
            loss: LossType::Bce,
            augmentations: vec![
                Augmentation::Identity,
                Augmentation::FlipHorizontal,
                Augmentation::FlipVertical,
            ],
            shuffle_seed: Some(7),
            drop_last: false,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        CheckpointConfig {
            dir: "models".to_string(),
            prefix: "clf".to_string(),
            extension: "mdl".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TrainError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrainError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Folds this configuration runs.
    pub fn fold_range(&self) -> Range<usize> {
        let cv = &self.cross_validation;
        cv.start_fold..cv.end_fold.unwrap_or(cv.n_splits)
    }

    pub fn validate(&self) -> Result<()> {
        let cv = &self.cross_validation;
        if cv.n_splits < 2 {
            return Err(TrainError::Config(format!("n_splits must be at least 2, got {}", cv.n_splits)));
        }
        let folds = self.fold_range();
        if folds.is_empty() || folds.end > cv.n_splits {
            return Err(TrainError::Config(format!(
                "fold range {}..{} must be non-empty and within 0..{}",
                folds.start, folds.end, cv.n_splits
            )));
        }

        let t = &self.training;
        if t.epochs == 0 {
            return Err(TrainError::Config("epochs must be at least 1".to_string()));
        }
        if t.batch_size == 0 || t.val_batch_size == 0 {
            return Err(TrainError::Config("batch sizes must be at least 1".to_string()));
        }
        if t.learning_rate.is_nan() || t.learning_rate <= 0.0 {
            return Err(TrainError::Config(format!("learning_rate must be positive, got {}", t.learning_rate)));
        }
        if !(0.0..1.0).contains(&t.momentum) {
            return Err(TrainError::Config(format!("momentum must be in [0, 1), got {}", t.momentum)));
        }
        if t.augmentations.is_empty() {
            return Err(TrainError::Config("at least one augmentation is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.fold_range(), 0..5);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.training.epochs = 3;
        config.logging.metrics_path = Some("metrics.jsonl".to_string());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            "[training]\nepochs = 2\naugmentations = [\"identity\", \"rotate180\"]\n\n[cross_validation]\nend_fold = 2\n",
        )
        .unwrap();
        assert_eq!(config.training.epochs, 2);
        assert_eq!(config.training.augmentations, vec![Augmentation::Identity, Augmentation::Rotate180]);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.fold_range(), 0..2);
        assert_eq!(config.checkpoint.prefix, "clf");
    }

    #[test]
    fn test_rejects_out_of_range_folds() {
        let mut config = Config::default();
        config.cross_validation.end_fold = Some(6);
        assert!(matches!(config.validate(), Err(TrainError::Config(_))));

        config.cross_validation.end_fold = None;
        config.cross_validation.start_fold = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(Config::load("/nonexistent/config.toml"), Err(TrainError::Config(_))));
    }
}
