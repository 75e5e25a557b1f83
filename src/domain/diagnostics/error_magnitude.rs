//! Mean absolute error between true and predicted signal codes.

use super::check_pair;
use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMagnitudeReport {
    pub mae: f64,
    /// |true[i] - predicted[i]| per bar.
    pub abs_errors: Vec<f64>,
}

pub fn analyze_error_magnitude(
    truth: &[Signal],
    predicted: &[Signal],
) -> Result<ErrorMagnitudeReport, SigbenchError> {
    check_pair(truth, predicted)?;
    let abs_errors: Vec<f64> = truth
        .iter()
        .zip(predicted)
        .map(|(&t, &p)| (f64::from(t) - f64::from(p)).abs())
        .collect();
    let mae = abs_errors.iter().sum::<f64>() / abs_errors.len() as f64;
    Ok(ErrorMagnitudeReport { mae, abs_errors })
}
