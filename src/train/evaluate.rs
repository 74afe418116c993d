use std::collections::BTreeMap;

use crate::data::batch::BatchSource;
use crate::error::{Result, TrainError};
use crate::loss::LossFunction;
use crate::metrics::classification::compute_classification_metrics;
use crate::metrics::ranking::compute_ranking_metric;
use crate::metrics::record::{prefix, MetricsRecord, Phase};
use crate::model::classifier::{Classifier, Mode, ModeGuard};
use crate::train::accumulator::{Observation, PredictionAccumulator};
use crate::train::logger::{MetricsLogger, Step};

/// Metrics of one epoch. `validation` drives checkpoint selection; `training`
/// is kept for progress reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub training: MetricsRecord,
    pub validation: MetricsRecord,
}

/// Closes a training epoch and scores the validation source.
///
/// 1. drains the epoch's training losses (`NoTrainingData` if none),
/// 2. computes training metrics from the accumulator,
/// 3. runs every validation batch, in inference mode when `switch_to_eval`
///    is set (the previous mode is restored on every exit path),
/// 4. computes validation metrics and mean loss (`NoValidationData` without a
///    loss function),
/// 5. logs both records, the training one with parameter summaries,
/// 6. resets the accumulator.
pub fn evaluate<C: Classifier + ?Sized>(
    classifier: &mut C,
    accumulator: &mut PredictionAccumulator,
    validation: &mut dyn BatchSource,
    loss_fn: Option<&dyn LossFunction>,
    logger: &mut dyn MetricsLogger,
    step: Step,
    switch_to_eval: bool,
) -> Result<Evaluation> {
    let train_losses = accumulator.drain(Observation::TrainLoss);
    let train_loss = mean(&train_losses).ok_or(TrainError::NoTrainingData)?;
    let mut training = phase_metrics(
        accumulator.get(Observation::Target),
        accumulator.get(Observation::Predicted),
        accumulator.get(Observation::Probability),
        Phase::Training,
    )?;
    training.insert(Phase::Training.loss_key(), train_loss);

    let validation = if switch_to_eval {
        let mut guard = ModeGuard::new(classifier, Mode::Inference);
        validation_pass(&mut *guard, validation, loss_fn)?
    } else {
        validation_pass(classifier, validation, loss_fn)?
    };

    let summaries = classifier.parameter_summaries();
    logger.log_and_reset(step, &training, Some(&summaries))?;
    logger.log_and_reset(step, &validation, None)?;

    accumulator.reset();
    Ok(Evaluation { training, validation })
}

/// One full pass over `source` without parameter updates, buffered locally.
fn validation_pass<C: Classifier + ?Sized>(
    classifier: &mut C,
    source: &mut dyn BatchSource,
    loss_fn: Option<&dyn LossFunction>,
) -> Result<MetricsRecord> {
    let expected = source.len();
    if expected == 0 {
        return Err(TrainError::EmptyBatchSource(source.name().to_string()));
    }
    let name = source.name().to_string();

    let mut targets = Vec::new();
    let mut classes = Vec::new();
    let mut probs = Vec::new();
    let mut losses = Vec::new();
    let mut seen = 0;

    for batch in source.batches().take(expected) {
        let batch = batch?;
        let prediction = classifier.predict(&batch.inputs)?;
        if let Some(loss_fn) = loss_fn {
            losses.push(loss_fn.loss(&prediction.scores, &batch.targets)?);
        }
        targets.extend_from_slice(&batch.targets);
        classes.extend(prediction.classes);
        probs.extend(prediction.scores);
        seen += 1;
    }
    if seen < expected {
        return Err(TrainError::BatchSource(format!(
            "'{name}' ended after {seen} of {expected} batches"
        )));
    }

    let mut record = phase_metrics(&targets, &classes, &probs, Phase::Validation)?;
    let val_loss = match loss_fn {
        None => return Err(TrainError::NoValidationData("no loss function given".to_string())),
        Some(_) => mean(&losses)
            .ok_or_else(|| TrainError::NoValidationData(format!("'{name}' produced no losses")))?,
    };
    record.insert(Phase::Validation.loss_key(), val_loss);
    Ok(record)
}

fn phase_metrics(targets: &[f64], predicted: &[f64], probs: &[f64], phase: Phase) -> Result<MetricsRecord> {
    let classification = compute_classification_metrics(targets, predicted)?;
    let ranking = compute_ranking_metric(targets, probs)?;

    let bare: BTreeMap<String, f64> = classification.entries()
        .into_iter()
        .chain(ranking.entries())
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Ok(prefix(bare, phase == Phase::Training))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
