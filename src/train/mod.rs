pub mod accumulator;
pub mod checkpoint;
pub mod crossval;
pub mod epoch;
pub mod epoch_stats;
pub mod evaluate;
pub mod logger;
pub mod radar;
pub mod train_config;

pub use accumulator::{Observation, PredictionAccumulator};
pub use checkpoint::{Checkpoint, CheckpointManager, CheckpointMeta};
pub use crossval::{CrossValidationReport, CrossValidator, FoldFailure, FoldResult, FoldRun, FoldSetup};
pub use epoch::run_epoch;
pub use epoch_stats::EpochStats;
pub use evaluate::{evaluate, Evaluation};
pub use logger::{JsonLinesSink, LogSink, MetricsLogger, Step};
pub use radar::RadarFoldSetup;
pub use train_config::TrainConfig;
