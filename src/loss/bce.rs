use crate::error::Result;
use crate::loss::{check_lengths, LossFunction};

/// Binary cross-entropy; pair with a sigmoid output.
#[derive(Debug, Clone, Copy, Default)]
pub struct BceLoss;

const EPS: f64 = 1e-12;

impl LossFunction for BceLoss {
    /// -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    fn loss(&self, scores: &[f64], targets: &[f64]) -> Result<f64> {
        check_lengths(scores, targets)?;
        let n = scores.len() as f64;
        Ok(scores.iter().zip(targets.iter())
            .map(|(p, y)| -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln()))
            .sum::<f64>() / n)
    }

    /// (p - y) / ((p + ε) · (1 - p + ε)) / n
    fn gradient(&self, scores: &[f64], targets: &[f64]) -> Result<Vec<f64>> {
        check_lengths(scores, targets)?;
        let n = scores.len() as f64;
        Ok(scores.iter().zip(targets.iter())
            .map(|(p, y)| (p - y) / ((p + EPS) * (1.0 - p + EPS)) / n)
            .collect())
    }
}
