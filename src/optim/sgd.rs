use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::model::classifier::Param;
use crate::optim::Optimizer;

/// Stochastic gradient descent with optional classical momentum:
/// `v ← μ·v + g`, `θ ← θ - lr·v`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    /// Velocity per parameter name; empty when momentum is zero.
    velocities: BTreeMap<String, Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, momentum: 0.0, velocities: BTreeMap::new() }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Sgd {
        self.momentum = momentum;
        self
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [Param<'_>]) {
        let lr = self.learning_rate;
        for p in params.iter_mut() {
            let update = if self.momentum == 0.0 {
                p.grad.clone()
            } else {
                let mu = self.momentum;
                let velocity = self.velocities
                    .entry(p.name.clone())
                    .or_insert_with(|| Matrix::zeros(p.grad.rows, p.grad.cols));
                *velocity = velocity.map(|v| v * mu) + p.grad.clone();
                velocity.clone()
            };
            *p.value = std::mem::take(p.value) - update.map(|x| x * lr);
        }
    }

    fn state_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn load_state_dict(&mut self, state: serde_json::Value) -> Result<()> {
        *self = serde_json::from_value(state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(value: &'a mut Matrix, grad: &'a mut Matrix) -> Param<'a> {
        Param { name: "w".to_string(), value, grad }
    }

    #[test]
    fn test_plain_step() {
        let mut value = Matrix::from_data(vec![vec![1.0, 2.0]]);
        let mut grad = Matrix::from_data(vec![vec![0.5, -1.0]]);
        let mut sgd = Sgd::new(0.1);
        sgd.step(&mut [param(&mut value, &mut grad)]);
        assert!((value.data[0][0] - 0.95).abs() < 1e-12);
        assert!((value.data[0][1] - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_accumulates_velocity() {
        let mut value = Matrix::from_data(vec![vec![0.0]]);
        let mut grad = Matrix::from_data(vec![vec![1.0]]);
        let mut sgd = Sgd::new(1.0).with_momentum(0.5);
        sgd.step(&mut [param(&mut value, &mut grad)]);
        sgd.step(&mut [param(&mut value, &mut grad)]);
        // v1 = 1, v2 = 1.5
        assert!((value.data[0][0] + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_grad() {
        let mut value = Matrix::zeros(1, 2);
        let mut grad = Matrix::from_data(vec![vec![3.0, 4.0]]);
        Sgd::new(0.1).zero_grad(&mut [param(&mut value, &mut grad)]);
        assert_eq!(grad.data, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_state_round_trip() {
        let mut value = Matrix::zeros(1, 1);
        let mut grad = Matrix::from_data(vec![vec![1.0]]);
        let mut sgd = Sgd::new(0.1).with_momentum(0.9);
        sgd.step(&mut [param(&mut value, &mut grad)]);

        let mut restored = Sgd::new(0.0);
        restored.load_state_dict(sgd.state_dict().unwrap()).unwrap();
        assert_eq!(restored.momentum, 0.9);
        assert_eq!(restored.velocities.len(), 1);
    }
}
