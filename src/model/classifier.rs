use std::ops::{Deref, DerefMut};

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::metrics::classification::classify;

/// Whether the classifier is being trained or only queried.
///
/// In `Training` mode a forward pass keeps what `backward` needs; in
/// `Inference` mode it does not, and `backward` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Training,
    Inference,
}

/// One trainable tensor together with its accumulated gradient.
pub struct Param<'a> {
    pub name: String,
    pub value: &'a mut Matrix,
    pub grad: &'a mut Matrix,
}

/// Norms of one parameter and its gradient, reported with training metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    pub value_norm: f64,
    pub value_mean: f64,
    pub grad_norm: f64,
}

/// Scores in [0, 1] and their thresholded classes for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub scores: Vec<f64>,
    pub classes: Vec<f64>,
}

/// A binary classifier producing one score in [0, 1] per input row.
///
/// Implementors provide `forward` and the mode/parameter plumbing; `predict`,
/// `classify` and `parameter_summaries` are shared.
pub trait Classifier {
    /// Scores for every row of `inputs` (`N × features`).
    fn forward(&mut self, inputs: &Matrix) -> Result<Vec<f64>>;

    /// Back-propagates ∂loss/∂score for the last training-mode forward pass,
    /// adding into each parameter's gradient.
    fn backward(&mut self, score_grad: &[f64]) -> Result<()>;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    /// Trainable parameters, in a stable order with stable names.
    fn parameters(&mut self) -> Vec<Param<'_>>;

    fn state_dict(&self) -> Result<serde_json::Value>;

    fn load_state_dict(&mut self, state: serde_json::Value) -> Result<()>;

    fn train(&mut self) {
        self.set_mode(Mode::Training);
    }

    fn eval(&mut self) {
        self.set_mode(Mode::Inference);
    }

    fn predict(&mut self, inputs: &Matrix) -> Result<Prediction> {
        let scores = self.forward(inputs)?;
        let classes = classify(&scores);
        Ok(Prediction { scores, classes })
    }

    fn classify(&mut self, inputs: &Matrix) -> Result<Vec<f64>> {
        Ok(self.predict(inputs)?.classes)
    }

    fn parameter_summaries(&mut self) -> Vec<ParameterSummary> {
        self.parameters()
            .into_iter()
            .map(|p| ParameterSummary {
                value_norm: p.value.norm(),
                value_mean: p.value.mean(),
                grad_norm: p.grad.norm(),
                name: p.name,
            })
            .collect()
    }
}

/// Holds a classifier in a given mode and restores the previous mode on drop,
/// including when the guarded work returns early with an error.
pub struct ModeGuard<'a, C: Classifier + ?Sized> {
    classifier: &'a mut C,
    previous: Mode,
}

impl<'a, C: Classifier + ?Sized> ModeGuard<'a, C> {
    pub fn new(classifier: &'a mut C, mode: Mode) -> Self {
        let previous = classifier.mode();
        classifier.set_mode(mode);
        ModeGuard { classifier, previous }
    }
}

impl<C: Classifier + ?Sized> Deref for ModeGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.classifier
    }
}

impl<C: Classifier + ?Sized> DerefMut for ModeGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.classifier
    }
}

impl<C: Classifier + ?Sized> Drop for ModeGuard<'_, C> {
    fn drop(&mut self) {
        self.classifier.set_mode(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrainError;

    struct Constant {
        mode: Mode,
        score: f64,
    }

    impl Classifier for Constant {
        fn forward(&mut self, inputs: &Matrix) -> Result<Vec<f64>> {
            Ok(vec![self.score; inputs.rows])
        }
        fn backward(&mut self, _score_grad: &[f64]) -> Result<()> {
            Ok(())
        }
        fn mode(&self) -> Mode {
            self.mode
        }
        fn set_mode(&mut self, mode: Mode) {
            self.mode = mode;
        }
        fn parameters(&mut self) -> Vec<Param<'_>> {
            Vec::new()
        }
        fn state_dict(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({ "score": self.score }))
        }
        fn load_state_dict(&mut self, _state: serde_json::Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_predict_thresholds_scores() {
        let mut clf = Constant { mode: Mode::Training, score: 0.7 };
        let p = clf.predict(&Matrix::zeros(3, 2)).unwrap();
        assert_eq!(p.scores, vec![0.7; 3]);
        assert_eq!(p.classes, vec![1.0; 3]);
    }

    #[test]
    fn test_mode_guard_restores_on_error_path() {
        let mut clf = Constant { mode: Mode::Training, score: 0.2 };

        let run = |c: &mut Constant| -> Result<()> {
            let guard = ModeGuard::new(c, Mode::Inference);
            assert_eq!(guard.mode(), Mode::Inference);
            Err(TrainError::BatchSource("boom".into()))
        };

        assert!(run(&mut clf).is_err());
        assert_eq!(clf.mode(), Mode::Training);
    }
}
