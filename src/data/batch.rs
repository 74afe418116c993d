use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;

/// Channel/height/width of one image; rows of a batch are flattened in this
/// order (channel-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl ImageShape {
    pub fn features(&self) -> usize {
        self.channels * self.height * self.width
    }
}

/// `N` flattened images and their `N` binary targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Vec<f64>,
    pub shape: ImageShape,
}

impl Batch {
    pub fn new(inputs: Matrix, targets: Vec<f64>, shape: ImageShape) -> Result<Batch> {
        if inputs.rows != targets.len() {
            return Err(TrainError::ShapeMismatch(format!(
                "batch has {} inputs but {} targets",
                inputs.rows,
                targets.len()
            )));
        }
        if inputs.rows > 0 && inputs.cols != shape.features() {
            return Err(TrainError::ShapeMismatch(format!(
                "rows have {} features, shape {:?} needs {}",
                inputs.cols,
                shape,
                shape.features()
            )));
        }
        Ok(Batch { inputs, targets, shape })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

pub type BatchIter<'a> = Box<dyn Iterator<Item = Result<Batch>> + 'a>;

/// A finite, re-iterable sequence of batches.
///
/// `batches` starts a fresh pass each time it is called and must yield exactly
/// `len()` batches. Fetching a batch may block.
pub trait BatchSource {
    /// Label used in logs and errors.
    fn name(&self) -> &str;

    /// Number of batches one pass yields.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn batches(&mut self) -> BatchIter<'_>;
}
