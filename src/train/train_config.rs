use std::ops::Range;
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::train::epoch_stats::EpochStats;

/// Run-time settings of a cross-validation run.
///
/// # Fields
/// - `folds`            — fold indices to run, e.g. `0..5`
/// - `epochs`           — epochs per fold
/// - `isolate_failures` — record a failing fold and continue instead of
///                        aborting the run
/// - `progress_tx`      — optional channel; one `EpochStats` per completed
///                        epoch. A dropped receiver is ignored.
/// - `stop_flag`        — optional atomic flag; when set the run stops at the
///                        next fold or epoch boundary.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub folds: Range<usize>,
    pub epochs: usize,
    pub isolate_failures: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(folds: Range<usize>, epochs: usize) -> Self {
        TrainConfig {
            folds,
            epochs,
            isolate_failures: false,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
