pub mod augment;
pub mod batch;
pub mod dataset;
pub mod folds;
pub mod loader;

pub use augment::Augmentation;
pub use batch::{Batch, BatchIter, BatchSource, ImageShape};
pub use dataset::{RadarDataset, RadarRecord};
pub use folds::KFold;
pub use loader::DataLoader;
