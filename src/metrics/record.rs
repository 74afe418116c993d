use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

/// Which pass a metrics record was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Training,
    Validation,
}

impl Phase {
    pub fn from_training(training: bool) -> Phase {
        if training { Phase::Training } else { Phase::Validation }
    }

    /// Prefix applied to metric names when a record is flattened.
    pub fn prefix(self) -> &'static str {
        match self {
            Phase::Training => "",
            Phase::Validation => "val_",
        }
    }

    /// Name under which the mean loss of this phase is stored.
    pub fn loss_key(self) -> &'static str {
        match self {
            Phase::Training => "train_loss",
            Phase::Validation => "loss",
        }
    }
}

/// Metric values tagged with the phase that produced them.
///
/// Names inside `metrics` are bare (`precision`, `auc`, ...); the phase
/// prefix is only applied by [`MetricsRecord::flatten`], so training and
/// validation records can be reported side by side without colliding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub phase: Phase,
    pub metrics: BTreeMap<String, f64>,
}

impl MetricsRecord {
    pub fn new(phase: Phase) -> Self {
        MetricsRecord { phase, metrics: BTreeMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.insert(name.into(), value);
    }

    pub fn extend<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, f64)>) {
        for (name, value) in entries {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Mean loss of the phase, if recorded.
    pub fn loss(&self) -> Option<f64> {
        self.get(self.phase.loss_key())
    }

    /// Metric names with the phase prefix applied (`val_auc`, `acc`, ...).
    pub fn flatten(&self) -> BTreeMap<String, f64> {
        let prefix = self.phase.prefix();
        self.metrics.iter()
            .map(|(k, v)| (format!("{prefix}{k}"), *v))
            .collect()
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.flatten() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{name}={value:.4}")?;
            first = false;
        }
        Ok(())
    }
}

/// Tags bare metric names with the phase: unprefixed when `training`, `val_`
/// when flattened otherwise.
pub fn prefix(metrics: BTreeMap<String, f64>, training: bool) -> MetricsRecord {
    MetricsRecord { phase: Phase::from_training(training), metrics }
}
