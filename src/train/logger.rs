use std::collections::BTreeMap;
use std::io::Write;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::metrics::record::{MetricsRecord, Phase};
use crate::model::classifier::ParameterSummary;

/// Position of a record in the run: fold index and 1-based epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub fold: usize,
    pub epoch: usize,
}

/// Sink for per-epoch metrics.
///
/// Receives the training record (with parameter summaries) and the validation
/// record (without) once per epoch, and flushes whatever it buffers.
pub trait MetricsLogger {
    fn log_and_reset(
        &mut self,
        step: Step,
        record: &MetricsRecord,
        parameters: Option<&[ParameterSummary]>,
    ) -> Result<()>;
}

impl MetricsLogger for Vec<Box<dyn MetricsLogger>> {
    fn log_and_reset(
        &mut self,
        step: Step,
        record: &MetricsRecord,
        parameters: Option<&[ParameterSummary]>,
    ) -> Result<()> {
        for sink in self.iter_mut() {
            sink.log_and_reset(step, record, parameters)?;
        }
        Ok(())
    }
}

/// Writes records through the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl MetricsLogger for LogSink {
    fn log_and_reset(
        &mut self,
        step: Step,
        record: &MetricsRecord,
        parameters: Option<&[ParameterSummary]>,
    ) -> Result<()> {
        info!("fold {} epoch {}: {}", step.fold, step.epoch, record);
        for p in parameters.unwrap_or_default() {
            debug!(
                "fold {} epoch {}: {} |w|={:.4} mean={:.4} |g|={:.6}",
                step.fold, step.epoch, p.name, p.value_norm, p.value_mean, p.grad_norm
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    fold: usize,
    epoch: usize,
    phase: Phase,
    metrics: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a [ParameterSummary]>,
}

/// Writes one JSON object per record and flushes after each.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsLogger for JsonLinesSink<W> {
    fn log_and_reset(
        &mut self,
        step: Step,
        record: &MetricsRecord,
        parameters: Option<&[ParameterSummary]>,
    ) -> Result<()> {
        let line = JsonLine {
            fold: step.fold,
            epoch: step.epoch,
            phase: record.phase,
            metrics: record.flatten(),
            parameters,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::record::prefix;

    #[test]
    fn test_json_lines_sink_writes_prefixed_keys() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let record = prefix([("auc".to_string(), 0.9)].into_iter().collect(), false);
        sink.log_and_reset(Step { fold: 1, epoch: 2 }, &record, None).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["fold"], 1);
        assert_eq!(value["phase"], "validation");
        assert_eq!(value["metrics"]["val_auc"], 0.9);
        assert!(value.get("parameters").is_none());
    }
}
