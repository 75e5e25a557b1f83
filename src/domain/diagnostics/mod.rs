//! Diagnostics comparing predicted against true signals.
//!
//! Four independent analyses share one input contract: an index-aligned,
//! non-empty pair of signal series.
//! - `distribution`: value counts, classification report, confusion matrix
//! - `error_magnitude`: MAE and per-bar absolute error
//! - `run_length`: run-length encoding and per-value run statistics
//! - `lead_lag`: timing offset of predicted vs. true change points

pub mod distribution;
pub mod error_magnitude;
pub mod lead_lag;
pub mod run_length;
pub mod summary;

use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;

pub(crate) fn check_pair(truth: &[Signal], predicted: &[Signal]) -> Result<(), SigbenchError> {
    if truth.is_empty() {
        return Err(SigbenchError::empty_series("signal series has no rows"));
    }
    if truth.len() != predicted.len() {
        return Err(SigbenchError::invalid_parameter(
            "predicted_signal",
            format!(
                "{} predictions for {} true signals",
                predicted.len(),
                truth.len()
            ),
        ));
    }
    Ok(())
}
