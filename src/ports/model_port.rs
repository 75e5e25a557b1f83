//! Forecast model port.
//!
//! The engine treats a model as a black box: it is fit on the training
//! partition only and must return exactly one prediction per feature row.

use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;

/// One row of model inputs per bar.
pub type FeatureRow = Vec<f64>;

pub trait ForecastModel {
    fn name(&self) -> &str;

    fn fit(&mut self, features: &[FeatureRow], labels: &[Signal]) -> Result<(), SigbenchError>;

    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<Signal>, SigbenchError>;
}

/// Calls `predict` and enforces output alignment with the input rows.
pub fn predict_aligned(
    model: &dyn ForecastModel,
    features: &[FeatureRow],
) -> Result<Vec<Signal>, SigbenchError> {
    let predictions = model.predict(features)?;
    if predictions.len() != features.len() {
        return Err(SigbenchError::ModelOutput {
            model: model.name().to_string(),
            expected: features.len(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}
