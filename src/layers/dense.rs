use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Activations kept from the last training-mode forward pass.
#[derive(Debug, Clone, Default)]
struct ForwardCache {
    inputs: Matrix,
    pre_neurons: Matrix, // z = xW + b, needed for the activation derivative
}

/// Fully connected layer operating on whole batches (`N × input_size` in,
/// `N × size` out).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    pub weights_grad: Matrix,
    #[serde(skip)]
    pub biases_grad: Matrix,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };

        Layer {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
            cache: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Forward pass for a batch. When `keep_cache` is set the inputs and
    /// pre-activations are retained for `backward`.
    pub fn feed_from(&mut self, input: Matrix, keep_cache: bool) -> Matrix {
        let z = input.matmul(&self.weights).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.cache = if keep_cache {
            Some(ForwardCache { inputs: input, pre_neurons: z })
        } else {
            None
        };
        a
    }

    /// Accumulates parameter gradients from `output_grad` (∂L/∂a, `N × size`)
    /// and returns ∂L/∂input. Returns `None` when no forward cache exists.
    pub fn backward(&mut self, output_grad: &Matrix) -> Option<Matrix> {
        let cache = self.cache.as_ref()?;
        // δ = ∂L/∂a ⊙ σ'(z)
        let act_derivative = cache.pre_neurons.map(|x| self.activator.derivative(x));
        let layer_delta = output_grad.hadamard(&act_derivative);

        let weights_adjustment = cache.inputs.transpose().matmul(&layer_delta);
        let biases_adjustment = layer_delta.column_sums();
        let input_grad = layer_delta.matmul(&self.weights.transpose());

        self.ensure_grad_shapes();
        self.weights_grad = std::mem::take(&mut self.weights_grad) + weights_adjustment;
        self.biases_grad = std::mem::take(&mut self.biases_grad) + biases_adjustment;

        Some(input_grad)
    }

    /// Gradient buffers are not serialized; restore their shape after a load.
    pub fn ensure_grad_shapes(&mut self) {
        if self.weights_grad.rows != self.weights.rows || self.weights_grad.cols != self.weights.cols {
            self.weights_grad = Matrix::zeros(self.weights.rows, self.weights.cols);
        }
        if self.biases_grad.rows != self.biases.rows || self.biases_grad.cols != self.biases.cols {
            self.biases_grad = Matrix::zeros(self.biases.rows, self.biases.cols);
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }
}
