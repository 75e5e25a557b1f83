//! Deterministic baseline forecast models.
//!
//! Both expect feature rows laid out as [`FEATURE_COLUMNS`].

use crate::domain::error::SigbenchError;
use crate::domain::label::{classify, LabelMode};
use crate::domain::signal::Signal;
use crate::ports::model_port::{FeatureRow, ForecastModel};

pub const FEATURE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

pub const MODEL_NAMES: [&str; 2] = [MajorityClassModel::NAME, MomentumModel::NAME];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub momentum_threshold: f64,
    pub mode: LabelMode,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            momentum_threshold: 0.0,
            mode: LabelMode::Multiclass,
        }
    }
}

/// Builds a model by its configured name.
pub fn build_model(
    name: &str,
    params: &ModelParams,
) -> Result<Box<dyn ForecastModel>, SigbenchError> {
    match name.trim().to_lowercase().as_str() {
        MajorityClassModel::NAME => Ok(Box::new(MajorityClassModel::default())),
        MomentumModel::NAME => Ok(Box::new(MomentumModel::new(
            params.momentum_threshold,
            params.mode,
        )?)),
        other => Err(SigbenchError::invalid_parameter(
            "model",
            format!(
                "unknown model '{}' (expected one of {})",
                other,
                MODEL_NAMES.join(", ")
            ),
        )),
    }
}

fn check_training_set(features: &[FeatureRow], labels: &[Signal]) -> Result<(), SigbenchError> {
    if labels.is_empty() {
        return Err(SigbenchError::empty_series("training set has no rows"));
    }
    if features.len() != labels.len() {
        return Err(SigbenchError::invalid_parameter(
            "labels",
            format!("{} labels for {} feature rows", labels.len(), features.len()),
        ));
    }
    Ok(())
}

/// Always predicts the most frequent training label.
#[derive(Debug, Clone, Default)]
pub struct MajorityClassModel {
    majority: Option<Signal>,
}

impl MajorityClassModel {
    pub const NAME: &'static str = "majority";

    pub fn majority(&self) -> Option<Signal> {
        self.majority
    }
}

impl ForecastModel for MajorityClassModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, features: &[FeatureRow], labels: &[Signal]) -> Result<(), SigbenchError> {
        check_training_set(features, labels)?;
        // (label, count) in first-seen order so ties keep the earliest label
        let mut counts: Vec<(Signal, usize)> = Vec::new();
        for &label in labels {
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }
        let mut best: Option<(Signal, usize)> = None;
        for (label, n) in counts {
            if best.is_none_or(|(_, top)| n > top) {
                best = Some((label, n));
            }
        }
        self.majority = best.map(|(label, _)| label);
        Ok(())
    }

    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<Signal>, SigbenchError> {
        let label = self.majority.ok_or_else(|| SigbenchError::Computation {
            reason: format!("model '{}' used before fit", Self::NAME),
        })?;
        Ok(vec![label; features.len()])
    }
}

/// Predicts the direction of the bar's own open-to-close move, classified
/// with the labeler's threshold rule.
#[derive(Debug, Clone)]
pub struct MomentumModel {
    threshold: f64,
    mode: LabelMode,
}

impl MomentumModel {
    pub const NAME: &'static str = "momentum";

    pub fn new(threshold: f64, mode: LabelMode) -> Result<Self, SigbenchError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SigbenchError::invalid_parameter(
                "momentum_threshold",
                format!("must be finite and >= 0, got {threshold}"),
            ));
        }
        Ok(Self { threshold, mode })
    }

    fn bar_signal(&self, row: &FeatureRow, index: usize) -> Result<Signal, SigbenchError> {
        let (Some(&open), Some(&close)) = (row.first(), row.get(3)) else {
            return Err(SigbenchError::invalid_parameter(
                "features",
                format!(
                    "row {index} has {} values, expected {}",
                    row.len(),
                    FEATURE_COLUMNS.len()
                ),
            ));
        };
        if open == 0.0 {
            return Ok(0);
        }
        Ok(classify((close - open) / open, self.threshold, self.mode))
    }
}

impl ForecastModel for MomentumModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, features: &[FeatureRow], labels: &[Signal]) -> Result<(), SigbenchError> {
        check_training_set(features, labels)
    }

    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<Signal>, SigbenchError> {
        features
            .iter()
            .enumerate()
            .map(|(i, row)| self.bar_signal(row, i))
            .collect()
    }
}
