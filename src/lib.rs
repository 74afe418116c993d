pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod model;
pub mod loss;
pub mod optim;
pub mod metrics;
pub mod data;
pub mod train;
pub mod config;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Network, NetworkSpec};
pub use model::{Classifier, Mode};
pub use loss::{BceLoss, LossFunction, LossType, MseLoss};
pub use optim::{Optimizer, Sgd};
pub use metrics::{MetricsRecord, Phase};
pub use data::{BatchSource, DataLoader, KFold, RadarDataset};
pub use train::{CrossValidationReport, CrossValidator, TrainConfig};
pub use config::Config;
pub use error::{Result, TrainError};
