pub mod sgd;

pub use sgd::Sgd;

use crate::error::Result;
use crate::model::classifier::Param;

/// Gradient-descent update rule bound to a classifier's parameters.
pub trait Optimizer {
    /// Clears accumulated gradients.
    fn zero_grad(&mut self, params: &mut [Param<'_>]) {
        for p in params.iter_mut() {
            p.grad.fill_zero();
        }
    }

    /// Applies one update from the current gradients.
    fn step(&mut self, params: &mut [Param<'_>]);

    fn state_dict(&self) -> Result<serde_json::Value>;

    fn load_state_dict(&mut self, state: serde_json::Value) -> Result<()>;
}
