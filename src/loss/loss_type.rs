use serde::{Serialize, Deserialize};

use crate::loss::{BceLoss, LossFunction, MseLoss};

/// Selects which loss function training uses.
///
/// - `Bce` — binary cross-entropy; the default for sigmoid scores.
/// - `Mse` — mean-squared error on the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    #[default]
    Bce,
    Mse,
}

impl LossType {
    pub fn build(self) -> Box<dyn LossFunction> {
        match self {
            LossType::Bce => Box::new(BceLoss),
            LossType::Mse => Box::new(MseLoss),
        }
    }
}
