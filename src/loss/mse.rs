use crate::error::Result;
use crate::loss::{check_lengths, LossFunction};

#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl LossFunction for MseLoss {
    /// mean((score - target)²)
    fn loss(&self, scores: &[f64], targets: &[f64]) -> Result<f64> {
        check_lengths(scores, targets)?;
        let n = scores.len() as f64;
        Ok(scores.iter().zip(targets.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n)
    }

    /// 2·(score - target) / n
    fn gradient(&self, scores: &[f64], targets: &[f64]) -> Result<Vec<f64>> {
        check_lengths(scores, targets)?;
        let n = scores.len() as f64;
        Ok(scores.iter().zip(targets.iter())
            .map(|(a, b)| 2.0 * (a - b) / n)
            .collect())
    }
}
