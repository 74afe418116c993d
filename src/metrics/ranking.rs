use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};

/// Receiver operating characteristic: one point per distinct score, sorted
/// from the highest threshold down, starting at (0, 0).
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Builds the curve for targets in {0, 1} (positive label `1.0`).
    ///
    /// Fails with `MetricUndefined` unless both classes are present.
    pub fn compute(targets: &[f64], scores: &[f64]) -> Result<Self> {
        if targets.len() != scores.len() {
            return Err(TrainError::ShapeMismatch(format!(
                "{} targets vs {} scores",
                targets.len(),
                scores.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| s.is_nan()) {
            return Err(TrainError::MetricUndefined(format!("score {bad} is not a number")));
        }

        let num_positive = targets.iter().filter(|&&y| y == 1.0).count();
        let num_negative = targets.len() - num_positive;
        if num_positive == 0 || num_negative == 0 {
            return Err(TrainError::MetricUndefined(format!(
                "ROC AUC needs both classes, got {num_positive} positive and {num_negative} negative"
            )));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];

        let (mut tp, mut fp) = (0usize, 0usize);
        for (rank, &idx) in order.iter().enumerate() {
            if targets[idx] == 1.0 {
                tp += 1;
            } else {
                fp += 1;
            }
            // Tied scores form a single operating point.
            let last_of_tie = order
                .get(rank + 1)
                .map_or(true, |&next| scores[next] != scores[idx]);
            if last_of_tie {
                fpr.push(fp as f64 / num_negative as f64);
                tpr.push(tp as f64 / num_positive as f64);
                thresholds.push(scores[idx]);
            }
        }

        Ok(RocCurve { fpr, tpr, thresholds })
    }

    /// Area under the curve by the trapezoidal rule.
    pub fn auc(&self) -> f64 {
        self.fpr.windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
            .sum()
    }
}

/// Threshold-free ranking quality of the scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingMetric {
    pub auc: f64,
}

impl RankingMetric {
    pub fn entries(&self) -> [(&'static str, f64); 1] {
        [("auc", self.auc)]
    }
}

pub fn compute_ranking_metric(targets: &[f64], probabilities: &[f64]) -> Result<RankingMetric> {
    let roc = RocCurve::compute(targets, probabilities)?;
    Ok(RankingMetric { auc: roc.auc() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let m = compute_ranking_metric(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.2, 0.8, 0.9]).unwrap();
        assert_eq!(m.auc, 1.0);
    }

    #[test]
    fn test_inverted_ranking() {
        let m = compute_ranking_metric(&[1.0, 1.0, 0.0, 0.0], &[0.1, 0.2, 0.8, 0.9]).unwrap();
        assert_eq!(m.auc, 0.0);
    }

    #[test]
    fn test_known_value() {
        // sklearn.metrics.roc_auc_score([0, 0, 1, 1], [0.1, 0.4, 0.35, 0.8]) == 0.75
        let m = compute_ranking_metric(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!((m.auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_all_tied_scores_give_half() {
        let m = compute_ranking_metric(&[0.0, 1.0, 0.0, 1.0], &[0.5; 4]).unwrap();
        assert!((m.auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_undefined() {
        assert!(matches!(
            compute_ranking_metric(&[1.0, 1.0], &[0.2, 0.9]),
            Err(TrainError::MetricUndefined(_))
        ));
    }

    #[test]
    fn test_curve_endpoints() {
        let roc = RocCurve::compute(&[0.0, 1.0, 1.0], &[0.3, 0.6, 0.6]).unwrap();
        assert_eq!((roc.fpr[0], roc.tpr[0]), (0.0, 0.0));
        assert_eq!((*roc.fpr.last().unwrap(), *roc.tpr.last().unwrap()), (1.0, 1.0));
        assert_eq!(roc.thresholds.len(), 3);
    }
}
