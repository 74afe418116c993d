use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::network::network::Network;

/// Describes one hidden layer.
///
/// Fields:
/// - `size`       — number of neurons in this layer
/// - `activation` — activation function applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: ActivationFunction,
}

/// Architecture recipe for the dense classifier.
///
/// A spec is turned into a fresh, independently initialised `Network` once
/// per fold; the single sigmoid output unit is appended by `build`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Hidden layers, input side first.
    pub hidden: Vec<LayerSpec>,
    /// Base seed; fold `k` initialises with `seed + k`.
    #[serde(default)]
    pub seed: u64,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec {
            hidden: vec![
                LayerSpec { size: 64, activation: ActivationFunction::Elu { alpha: 1.0 } },
                LayerSpec { size: 16, activation: ActivationFunction::Elu { alpha: 1.0 } },
            ],
            seed: 0,
        }
    }
}

impl NetworkSpec {
    /// Builds a new network for `fold` taking `input_size` features per row.
    pub fn build(&self, input_size: usize, fold: usize) -> Result<Network> {
        if input_size == 0 {
            return Err(TrainError::Config("network input size must be positive".to_string()));
        }
        if let Some(bad) = self.hidden.iter().position(|l| l.size == 0) {
            return Err(TrainError::Config(format!("hidden layer {bad} has zero neurons")));
        }

        let mut tuples = Vec::with_capacity(self.hidden.len() + 1);
        let mut prev = input_size;
        for layer in &self.hidden {
            tuples.push((layer.size, prev, layer.activation));
            prev = layer.size;
        }
        tuples.push((1, prev, ActivationFunction::Sigmoid));

        Ok(Network::new(tuples, self.seed.wrapping_add(fold as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Classifier;

    #[test]
    fn test_build_appends_sigmoid_output() {
        let net = NetworkSpec::default().build(10, 0).unwrap();
        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.layers[2].size, 1);
        assert_eq!(net.layers[2].activator, ActivationFunction::Sigmoid);
        assert_eq!(net.input_size(), 10);
    }

    #[test]
    fn test_folds_get_different_initialisation() {
        let spec = NetworkSpec::default();
        let mut a = spec.build(4, 0).unwrap();
        let mut b = spec.build(4, 1).unwrap();
        assert_ne!(a.parameters()[0].value.data, b.parameters()[0].value.data);
    }

    #[test]
    fn test_zero_input_rejected() {
        assert!(matches!(NetworkSpec::default().build(0, 0), Err(TrainError::Config(_))));
    }
}
