use log::{debug, trace};

use crate::data::batch::BatchSource;
use crate::error::{Result, TrainError};
use crate::loss::LossFunction;
use crate::model::classifier::Classifier;
use crate::optim::Optimizer;
use crate::train::accumulator::PredictionAccumulator;

/// Runs one training epoch over every source in order.
///
/// Each source is exhausted before the next starts and parameters carry over
/// between sources. For every batch: forward, classify, loss, zero_grad,
/// backward, step, then the batch's observations go into `accumulator`.
///
/// # Errors
/// `EmptyBatchSource` if a source has no batches, `BatchSource` if it ends
/// before its advertised length, plus anything the collaborators return.
pub fn run_epoch<C: Classifier + ?Sized>(
    classifier: &mut C,
    optimizer: &mut dyn Optimizer,
    loss_fn: &dyn LossFunction,
    sources: &mut [Box<dyn BatchSource>],
    accumulator: &mut PredictionAccumulator,
) -> Result<()> {
    for source in sources.iter_mut() {
        let expected = source.len();
        if expected == 0 {
            return Err(TrainError::EmptyBatchSource(source.name().to_string()));
        }
        let name = source.name().to_string();
        debug!("training on '{name}' ({expected} batches)");

        let mut seen = 0;
        for batch in source.batches().take(expected) {
            let batch = batch?;
            let prediction = classifier.predict(&batch.inputs)?;

            optimizer.zero_grad(&mut classifier.parameters());
            let loss = loss_fn.loss(&prediction.scores, &batch.targets)?;
            let grad = loss_fn.gradient(&prediction.scores, &batch.targets)?;
            classifier.backward(&grad)?;
            optimizer.step(&mut classifier.parameters());

            accumulator.append(&batch.targets, &prediction.classes, loss, &prediction.scores)?;
            seen += 1;
            trace!("'{name}' batch {seen}/{expected}: loss={loss:.5}");
        }

        if seen < expected {
            return Err(TrainError::BatchSource(format!(
                "'{name}' ended after {seen} of {expected} batches"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batch::{Batch, BatchIter, ImageShape};
    use crate::loss::BceLoss;
    use crate::math::matrix::Matrix;
    use crate::network::NetworkSpec;
    use crate::optim::Sgd;
    use crate::train::accumulator::Observation;

    const SHAPE: ImageShape = ImageShape { channels: 1, height: 1, width: 2 };

    struct Fixed {
        name: String,
        batches: Vec<Batch>,
        advertised: usize,
    }

    impl Fixed {
        fn new(name: &str, n: usize) -> Self {
            let batch = Batch::new(
                Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
                vec![1.0, 0.0],
                SHAPE,
            ).unwrap();
            Fixed { name: name.to_string(), batches: vec![batch; n], advertised: n }
        }
    }

    impl BatchSource for Fixed {
        fn name(&self) -> &str {
            &self.name
        }
        fn len(&self) -> usize {
            self.advertised
        }
        fn batches(&mut self) -> BatchIter<'_> {
            Box::new(self.batches.clone().into_iter().map(Ok))
        }
    }

    fn network() -> crate::network::Network {
        NetworkSpec::default().build(2, 0).unwrap()
    }

    #[test]
    fn test_every_source_and_batch_is_recorded() {
        let mut sources: Vec<Box<dyn BatchSource>> = vec![Box::new(Fixed::new("a", 2)), Box::new(Fixed::new("b", 3))];
        let mut acc = PredictionAccumulator::new();
        let mut net = network();
        run_epoch(&mut net, &mut Sgd::new(0.01), &BceLoss, &mut sources, &mut acc).unwrap();

        assert_eq!(acc.get(Observation::TrainLoss).len(), 5);
        assert_eq!(acc.samples(), 10);
        assert_eq!(acc.get(Observation::Predicted).len(), acc.get(Observation::Probability).len());
    }

    #[test]
    fn test_parameters_change() {
        let mut sources: Vec<Box<dyn BatchSource>> = vec![Box::new(Fixed::new("a", 1))];
        let mut net = network();
        let before = net.layers[0].weights.clone();
        run_epoch(&mut net, &mut Sgd::new(0.1), &BceLoss, &mut sources, &mut PredictionAccumulator::new()).unwrap();
        assert_ne!(net.layers[0].weights, before);
    }

    #[test]
    fn test_empty_source_is_error() {
        let mut sources: Vec<Box<dyn BatchSource>> = vec![Box::new(Fixed::new("empty", 0))];
        let err = run_epoch(&mut network(), &mut Sgd::new(0.1), &BceLoss, &mut sources, &mut PredictionAccumulator::new())
            .unwrap_err();
        assert!(matches!(err, TrainError::EmptyBatchSource(name) if name == "empty"));
    }

    #[test]
    fn test_short_source_is_error() {
        let mut short = Fixed::new("short", 1);
        short.advertised = 2;
        let mut sources: Vec<Box<dyn BatchSource>> = vec![Box::new(short)];
        let err = run_epoch(&mut network(), &mut Sgd::new(0.1), &BceLoss, &mut sources, &mut PredictionAccumulator::new())
            .unwrap_err();
        assert!(matches!(err, TrainError::BatchSource(_)));
    }
}
