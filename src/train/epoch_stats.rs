use serde::{Serialize, Deserialize};

/// Per-epoch progress emitted by the cross-validation driver.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the driver
/// sends one `EpochStats` value after every completed epoch (after the
/// checkpoint is written).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub fold: usize,
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested per fold.
    pub total_epochs: usize,
    /// Mean training loss over the epoch's batches.
    pub train_loss: f64,
    pub val_loss: f64,
    pub val_accuracy: Option<f64>,
    pub val_auc: Option<f64>,
    /// Whether this epoch set a new best validation loss for the fold.
    pub is_best: bool,
    /// Wall-clock duration of train + evaluate + checkpoint in milliseconds.
    pub elapsed_ms: u64,
}
