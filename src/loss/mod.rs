pub mod bce;
pub mod mse;
pub mod loss_type;

pub use bce::BceLoss;
pub use mse::MseLoss;
pub use loss_type::LossType;

use crate::error::{Result, TrainError};

/// A differentiable loss over one batch of scores.
pub trait LossFunction {
    /// Scalar loss averaged over the batch.
    fn loss(&self, scores: &[f64], targets: &[f64]) -> Result<f64>;

    /// ∂loss/∂score for every sample (already divided by the batch size).
    fn gradient(&self, scores: &[f64], targets: &[f64]) -> Result<Vec<f64>>;
}

pub(crate) fn check_lengths(scores: &[f64], targets: &[f64]) -> Result<()> {
    if scores.len() != targets.len() {
        return Err(TrainError::ShapeMismatch(format!(
            "{} scores vs {} targets",
            scores.len(),
            targets.len()
        )));
    }
    if scores.is_empty() {
        return Err(TrainError::ShapeMismatch("loss of an empty batch".to_string()));
    }
    Ok(())
}
