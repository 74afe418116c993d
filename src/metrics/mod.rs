//! Classification and ranking metrics for binary scores.
//!
//! Everything here is a pure function of targets and predictions; the
//! training and validation paths share the same code and differ only in the
//! [`Phase`] tag of the resulting [`MetricsRecord`].

pub mod classification;
pub mod ranking;
pub mod record;

pub use classification::{classify, classify_score, compute_classification_metrics, ClassificationMetrics, THRESHOLD};
pub use ranking::{compute_ranking_metric, RankingMetric, RocCurve};
pub use record::{prefix, MetricsRecord, Phase};
