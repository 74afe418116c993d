use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::model::classifier::{Classifier, Mode, Param};

/// Stack of dense layers over flattened images. The last layer has a single
/// sigmoid unit so every row maps to one score in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(skip, default = "default_mode")]
    mode: Mode,
}

fn default_mode() -> Mode {
    Mode::Training
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples, drawing
    /// initial weights from a generator seeded with `seed`.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>, seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, &mut rng))
            .collect();
        Network { layers, mode: Mode::Training }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }
}

impl Classifier for Network {
    fn forward(&mut self, inputs: &Matrix) -> Result<Vec<f64>> {
        if inputs.cols != self.input_size() {
            return Err(TrainError::ShapeMismatch(format!(
                "network expects {} input features, batch has {}",
                self.input_size(),
                inputs.cols
            )));
        }
        let keep_cache = self.mode == Mode::Training;
        let mut current = inputs.clone();
        for layer in &mut self.layers {
            current = layer.feed_from(current, keep_cache);
        }
        if current.cols != 1 {
            return Err(TrainError::ShapeMismatch(format!(
                "classifier output must have one column, got {}",
                current.cols
            )));
        }
        Ok(current.column_values(0))
    }

    fn backward(&mut self, score_grad: &[f64]) -> Result<()> {
        let mut delta = Matrix::column(score_grad);
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta).ok_or_else(|| {
                TrainError::InvalidMode(
                    "backward requires a preceding forward pass in training mode".to_string(),
                )
            })?;
        }
        Ok(())
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::Inference {
            self.layers.iter_mut().for_each(Layer::clear_cache);
        }
        self.mode = mode;
    }

    fn parameters(&mut self) -> Vec<Param<'_>> {
        self.layers.iter_mut()
            .enumerate()
            .flat_map(|(i, layer)| {
                layer.ensure_grad_shapes();
                let Layer { weights, biases, weights_grad, biases_grad, .. } = layer;
                [
                    Param { name: format!("layers.{i}.weights"), value: weights, grad: weights_grad },
                    Param { name: format!("layers.{i}.biases"), value: biases, grad: biases_grad },
                ]
            })
            .collect()
    }

    fn state_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn load_state_dict(&mut self, state: serde_json::Value) -> Result<()> {
        let loaded: Network = serde_json::from_value(state)?;
        if loaded.layers.len() != self.layers.len()
            || loaded.layers.iter().zip(&self.layers).any(|(a, b)| {
                a.weights.rows != b.weights.rows || a.weights.cols != b.weights.cols
            })
        {
            return Err(TrainError::ShapeMismatch(
                "saved network architecture differs from this network".to_string(),
            ));
        }
        self.layers = loaded.layers;
        self.layers.iter_mut().for_each(Layer::ensure_grad_shapes);
        Ok(())
    }
}
