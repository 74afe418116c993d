pub mod classifier;

pub use classifier::{Classifier, Mode, ModeGuard, Param, ParameterSummary, Prediction};
