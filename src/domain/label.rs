//! Directional labels from future price moves.
//!
//! future_return[i] = (P[i+n] - P[i]) / P[i]
//! The last n bars have no future price and stay unlabelled.

use crate::domain::error::SigbenchError;
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::Signal;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// 1 = up, 0 = not up.
    Binary,
    /// 1 = up, -1 = down, 0 = flat.
    Multiclass,
}

impl FromStr for LabelMode {
    type Err = SigbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binary" => Ok(LabelMode::Binary),
            "multiclass" => Ok(LabelMode::Multiclass),
            other => Err(SigbenchError::invalid_parameter(
                "mode",
                format!("unknown label mode '{other}' (expected binary or multiclass)"),
            )),
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelMode::Binary => f.write_str("binary"),
            LabelMode::Multiclass => f.write_str("multiclass"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelParams {
    pub horizon: usize,
    pub threshold: f64,
    pub target: PriceField,
    pub mode: LabelMode,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            horizon: 1,
            threshold: 0.001,
            target: PriceField::Close,
            mode: LabelMode::Multiclass,
        }
    }
}

impl LabelParams {
    pub fn validate(&self) -> Result<(), SigbenchError> {
        if self.horizon < 1 {
            return Err(SigbenchError::invalid_parameter(
                "horizon",
                "must be at least 1",
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(SigbenchError::invalid_parameter(
                "threshold",
                format!("must be a non-negative number, got {}", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Strategy for turning a price series into one label per bar.
pub trait LabelGenerator {
    fn generate(&self, prices: &PriceSeries) -> Result<Vec<Option<Signal>>, SigbenchError>;
}

/// Labels each bar by the direction of the move `horizon` bars ahead.
#[derive(Debug, Clone, Default)]
pub struct PriceDirectionLabeler {
    pub params: LabelParams,
}

impl PriceDirectionLabeler {
    pub fn new(params: LabelParams) -> Self {
        Self { params }
    }
}

impl LabelGenerator for PriceDirectionLabeler {
    fn generate(&self, prices: &PriceSeries) -> Result<Vec<Option<Signal>>, SigbenchError> {
        self.params.validate()?;
        let series = prices.column(self.params.target);
        let returns = future_returns(&series, self.params.horizon)?;
        Ok(returns
            .into_iter()
            .map(|r| r.map(|r| classify(r, self.params.threshold, self.params.mode)))
            .collect())
    }
}

/// Forward return over `horizon` bars for each position. `None` where the
/// horizon runs past the end or the reference price is zero.
pub fn future_returns(values: &[f64], horizon: usize) -> Result<Vec<Option<f64>>, SigbenchError> {
    if horizon < 1 {
        return Err(SigbenchError::invalid_parameter(
            "horizon",
            "must be at least 1",
        ));
    }
    if values.len() < horizon + 1 {
        return Err(SigbenchError::invalid_parameter(
            "horizon",
            format!(
                "series of {} bars is too short for horizon {} (need at least {})",
                values.len(),
                horizon,
                horizon + 1
            ),
        ));
    }

    Ok((0..values.len())
        .map(|i| {
            let future = values.get(i + horizon)?;
            let current = values[i];
            if current == 0.0 {
                return None;
            }
            Some((future - current) / current)
        })
        .collect())
}

/// Comparisons are strict: a return exactly on +/- threshold is flat.
pub fn classify(future_return: f64, threshold: f64, mode: LabelMode) -> Signal {
    match mode {
        LabelMode::Binary => Signal::from(future_return > threshold),
        LabelMode::Multiclass => {
            if future_return > threshold {
                1
            } else if future_return < -threshold {
                -1
            } else {
                0
            }
        }
    }
}
