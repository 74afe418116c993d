use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{info, warn};
use serde::{Serialize, Deserialize};

use crate::data::batch::BatchSource;
use crate::error::{Result, TrainError};
use crate::loss::LossFunction;
use crate::metrics::record::MetricsRecord;
use crate::model::classifier::Classifier;
use crate::optim::Optimizer;
use crate::train::accumulator::PredictionAccumulator;
use crate::train::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::train::epoch::run_epoch;
use crate::train::epoch_stats::EpochStats;
use crate::train::evaluate::evaluate;
use crate::train::logger::{MetricsLogger, Step};
use crate::train::train_config::TrainConfig;

/// Everything one fold trains with. Built fresh per fold and dropped when the
/// fold ends, so no parameters or optimizer state cross fold boundaries.
pub struct FoldRun<C, O> {
    pub classifier: C,
    pub optimizer: O,
    /// Augmented views of the fold's training split, used in order.
    pub train_sources: Vec<Box<dyn BatchSource>>,
    pub validation: Box<dyn BatchSource>,
}

/// Builds the per-fold collaborators.
pub trait FoldSetup {
    type Classifier: Classifier;
    type Optimizer: Optimizer;

    fn build(&mut self, fold: usize) -> Result<FoldRun<Self::Classifier, Self::Optimizer>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold: usize,
    pub best_val_loss: f64,
    /// 1-based epoch that reached `best_val_loss`.
    pub best_epoch: usize,
}

/// A fold that failed while `isolate_failures` was set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldFailure {
    pub fold: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub failures: Vec<FoldFailure>,
    /// Set when the stop flag ended the run early.
    pub cancelled: bool,
}

impl CrossValidationReport {
    /// Best validation loss of every completed fold, in fold order.
    pub fn best_losses(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.best_val_loss).collect()
    }

    pub fn mean_best_loss(&self) -> Option<f64> {
        if self.folds.is_empty() {
            return None;
        }
        Some(self.best_losses().iter().sum::<f64>() / self.folds.len() as f64)
    }
}

/// Repeats train → evaluate → checkpoint for every fold and collects each
/// fold's best validation loss.
pub struct CrossValidator {
    config: TrainConfig,
    checkpoints: CheckpointManager,
}

impl CrossValidator {
    pub fn new(config: TrainConfig, checkpoints: CheckpointManager) -> Self {
        CrossValidator { config, checkpoints }
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    fn stop_requested(&self) -> bool {
        self.config.stop_flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Runs every configured fold in order.
    ///
    /// A fold error aborts the run unless `isolate_failures` is set, in which
    /// case it is recorded in the report and the next fold starts.
    pub fn run<S: FoldSetup>(
        &self,
        setup: &mut S,
        loss_fn: &dyn LossFunction,
        logger: &mut dyn MetricsLogger,
    ) -> Result<CrossValidationReport> {
        if self.config.epochs == 0 {
            return Err(TrainError::Config("epochs must be at least 1".to_string()));
        }

        let mut report = CrossValidationReport::default();
        for fold in self.config.folds.clone() {
            if self.stop_requested() {
                report.cancelled = true;
                break;
            }
            info!("fold {fold}: starting ({} epochs)", self.config.epochs);

            match self.run_fold(fold, setup, loss_fn, logger) {
                Ok(Some(result)) => {
                    info!(
                        "fold {fold}: best val_loss {:.5} at epoch {}",
                        result.best_val_loss, result.best_epoch
                    );
                    report.folds.push(result);
                }
                Ok(None) => {
                    info!("fold {fold}: stopped before completion");
                    report.cancelled = true;
                    break;
                }
                Err(e) if self.config.isolate_failures => {
                    warn!("fold {fold}: failed, continuing with next fold: {e}");
                    report.failures.push(FoldFailure { fold, error: e.to_string() });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Returns `None` if the stop flag interrupted the fold.
    fn run_fold<S: FoldSetup>(
        &self,
        fold: usize,
        setup: &mut S,
        loss_fn: &dyn LossFunction,
        logger: &mut dyn MetricsLogger,
    ) -> Result<Option<FoldResult>> {
        let FoldRun { mut classifier, mut optimizer, mut train_sources, mut validation } = setup.build(fold)?;
        if train_sources.is_empty() {
            return Err(TrainError::EmptyBatchSource(format!("fold {fold} training sources")));
        }
        classifier.train();
        let mut accumulator = PredictionAccumulator::new();

        let mut best_loss = f64::INFINITY;
        let mut best_epoch = 0;

        for epoch in 1..=self.config.epochs {
            if self.stop_requested() {
                return Ok(None);
            }
            let t_start = Instant::now();

            run_epoch(&mut classifier, &mut optimizer, loss_fn, &mut train_sources, &mut accumulator)?;

            let step = Step { fold, epoch };
            let evaluation = evaluate(
                &mut classifier,
                &mut accumulator,
                validation.as_mut(),
                Some(loss_fn),
                logger,
                step,
                true,
            )?;
            let val_loss = evaluation.validation.loss().ok_or_else(|| {
                TrainError::NoValidationData("validation record has no loss".to_string())
            })?;

            let is_best = val_loss < best_loss;
            best_loss = best_loss.min(val_loss);
            if is_best {
                best_epoch = epoch;
            }

            let meta = CheckpointMeta { epoch, fold, val_loss, is_best };
            self.checkpoints.save(&self.checkpoints.epoch_path(epoch, fold), &classifier, &optimizer, meta)?;

            let stats = epoch_stats(step, self.config.epochs, &evaluation.training, &evaluation.validation, is_best, t_start);
            info!(
                "fold {fold} epoch {epoch}/{}: train_loss={:.5} val_loss={val_loss:.5}{}",
                self.config.epochs,
                stats.train_loss,
                if is_best { " (best)" } else { "" }
            );
            if let Some(ref tx) = self.config.progress_tx {
                // A dropped receiver only loses progress updates.
                let _ = tx.send(stats);
            }
        }

        Ok(Some(FoldResult { fold, best_val_loss: best_loss, best_epoch }))
    }
}

fn epoch_stats(
    step: Step,
    total_epochs: usize,
    training: &MetricsRecord,
    validation: &MetricsRecord,
    is_best: bool,
    t_start: Instant,
) -> EpochStats {
    EpochStats {
        fold: step.fold,
        epoch: step.epoch,
        total_epochs,
        train_loss: training.loss().unwrap_or(f64::NAN),
        val_loss: validation.loss().unwrap_or(f64::NAN),
        val_accuracy: validation.get("acc"),
        val_auc: validation.get("auc"),
        is_best,
        elapsed_ms: t_start.elapsed().as_millis() as u64,
    }
}
