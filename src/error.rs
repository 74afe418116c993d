//! Error types for training and evaluation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the current fold (or the whole run).
#[derive(Error, Debug)]
pub enum TrainError {
    /// A batch source that must yield at least one batch yielded none.
    #[error("batch source '{0}' is empty")]
    EmptyBatchSource(String),

    /// A batch source failed or ended before its advertised length.
    #[error("batch source error: {0}")]
    BatchSource(String),

    /// Training losses were requested but nothing was accumulated.
    #[error("no training data accumulated for this epoch")]
    NoTrainingData,

    /// Validation loss was requested without a loss function or batches.
    #[error("no validation data: {0}")]
    NoValidationData(String),

    /// A metric is undefined for the given labels (e.g. AUC with one class).
    #[error("metric undefined: {0}")]
    MetricUndefined(String),

    /// Two sequences that must line up do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An operation was called in the wrong classifier mode.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Writing a checkpoint failed; previously written files are untouched.
    #[error("failed to write checkpoint {}: {source}", path.display())]
    CheckpointWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or decoding a checkpoint failed.
    #[error("failed to read checkpoint {}: {reason}", path.display())]
    CheckpointRead { path: PathBuf, reason: String },

    /// The input dataset is malformed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;
