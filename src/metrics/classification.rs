use log::warn;
use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};

/// Decision threshold shared by every fold and phase. Scores strictly above
/// it are the positive class.
pub const THRESHOLD: f64 = 0.5;

const POSITIVE: f64 = 1.0;

pub fn classify_score(score: f64) -> f64 {
    if score > THRESHOLD { 1.0 } else { 0.0 }
}

/// Thresholds every score; `0.5` itself maps to the negative class.
pub fn classify(scores: &[f64]) -> Vec<f64> {
    scores.iter().map(|&s| classify_score(s)).collect()
}

/// Precision, recall and accuracy with `1.0` as the positive label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub accuracy: f64,
}

impl ClassificationMetrics {
    /// Metric names as they appear in records and logs.
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [("precision", self.precision), ("recall", self.recall), ("acc", self.accuracy)]
    }
}

/// Computes precision, recall and accuracy.
///
/// Zero-division policy: when no sample is predicted positive (precision) or
/// no target is positive (recall) the ratio is reported as `0.0` and a warning
/// is logged. An empty input is `MetricUndefined`.
pub fn compute_classification_metrics(targets: &[f64], predicted: &[f64]) -> Result<ClassificationMetrics> {
    if targets.len() != predicted.len() {
        return Err(TrainError::ShapeMismatch(format!(
            "{} targets vs {} predictions",
            targets.len(),
            predicted.len()
        )));
    }
    if targets.is_empty() {
        return Err(TrainError::MetricUndefined(
            "classification metrics of an empty set".to_string(),
        ));
    }

    let (mut tp, mut fp, mut fn_, mut correct) = (0usize, 0usize, 0usize, 0usize);
    for (&y, &p) in targets.iter().zip(predicted) {
        let actual = y == POSITIVE;
        let guessed = p == POSITIVE;
        match (actual, guessed) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
        if y == p {
            correct += 1;
        }
    }

    let precision = ratio(tp, tp + fp, "precision", "no positive predictions");
    let recall = ratio(tp, tp + fn_, "recall", "no positive targets");
    let accuracy = correct as f64 / targets.len() as f64;

    Ok(ClassificationMetrics { precision, recall, accuracy })
}

fn ratio(num: usize, den: usize, metric: &str, why: &str) -> f64 {
    if den == 0 {
        warn!("{metric} is ill-defined ({why}); reporting 0.0");
        0.0
    } else {
        num as f64 / den as f64
    }
}
