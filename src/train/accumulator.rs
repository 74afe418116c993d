use crate::error::{Result, TrainError};

/// Kinds of observation recorded for every training batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    Target,
    Predicted,
    Probability,
    TrainLoss,
}

/// Running store of one epoch's training observations.
///
/// Owned by the fold loop and lent by `&mut` to the epoch runner (which
/// appends) and the evaluator (which drains and resets). The three per-sample
/// sequences always have equal length; `train_loss` holds one value per batch.
#[derive(Debug, Clone, Default)]
pub struct PredictionAccumulator {
    targets: Vec<f64>,
    predicted: Vec<f64>,
    probs: Vec<f64>,
    train_loss: Vec<f64>,
}

impl PredictionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one batch worth of observations.
    pub fn append(&mut self, targets: &[f64], predicted: &[f64], loss: f64, probs: &[f64]) -> Result<()> {
        if targets.len() != predicted.len() || targets.len() != probs.len() {
            return Err(TrainError::ShapeMismatch(format!(
                "batch observations disagree: {} targets, {} predictions, {} probabilities",
                targets.len(),
                predicted.len(),
                probs.len()
            )));
        }
        self.targets.extend_from_slice(targets);
        self.predicted.extend_from_slice(predicted);
        self.probs.extend_from_slice(probs);
        self.train_loss.push(loss);
        Ok(())
    }

    pub fn get(&self, key: Observation) -> &[f64] {
        match key {
            Observation::Target => &self.targets,
            Observation::Predicted => &self.predicted,
            Observation::Probability => &self.probs,
            Observation::TrainLoss => &self.train_loss,
        }
    }

    /// Removes and returns the whole sequence for `key`.
    pub fn drain(&mut self, key: Observation) -> Vec<f64> {
        let seq = match key {
            Observation::Target => &mut self.targets,
            Observation::Predicted => &mut self.predicted,
            Observation::Probability => &mut self.probs,
            Observation::TrainLoss => &mut self.train_loss,
        };
        std::mem::take(seq)
    }

    /// Clears every sequence. Must run once per epoch boundary so the next
    /// epoch's metrics only see its own batches.
    pub fn reset(&mut self) {
        self.targets.clear();
        self.predicted.clear();
        self.probs.clear();
        self.train_loss.clear();
    }

    /// Number of samples recorded this epoch.
    pub fn samples(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_drain() {
        let mut acc = PredictionAccumulator::new();
        acc.append(&[1.0, 0.0], &[1.0, 1.0], 0.4, &[0.8, 0.6]).unwrap();
        acc.append(&[0.0], &[0.0], 0.2, &[0.1]).unwrap();
        assert_eq!(acc.samples(), 3);
        assert_eq!(acc.drain(Observation::TrainLoss), vec![0.4, 0.2]);
        assert!(acc.get(Observation::TrainLoss).is_empty());
        assert_eq!(acc.get(Observation::Probability), &[0.8, 0.6, 0.1]);
    }

    #[test]
    fn test_reset_then_drain_is_empty() {
        let mut acc = PredictionAccumulator::new();
        acc.append(&[1.0], &[1.0], 0.1, &[0.9]).unwrap();
        acc.reset();
        for key in [Observation::Target, Observation::Predicted, Observation::Probability, Observation::TrainLoss] {
            assert!(acc.drain(key).is_empty());
        }
    }

    #[test]
    fn test_mismatched_batch_rejected() {
        let mut acc = PredictionAccumulator::new();
        assert!(acc.append(&[1.0, 0.0], &[1.0], 0.1, &[0.9, 0.1]).is_err());
        assert_eq!(acc.samples(), 0);
    }
}
