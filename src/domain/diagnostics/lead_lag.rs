//! Timing offset between true signal changes and the model catching up.
//!
//! A change point is an index i > 0 with true[i] != true[i-1]. Change points
//! the model already gets right are skipped. For the rest, lags are scanned
//! from -max_lag to +max_lag and the first j = i + lag where the prediction
//! *transitions into* true[i] is taken:
//!
//!   pred[j] == true[i] && (j == 0 || pred[j-1] != true[i])
//!
//! Positive lag: model late. Negative lag: model early. A change point with
//! no such j in the window is undetected and left out of the statistics.

use super::check_pair;
use super::summary::{histogram, IntegerSummary};
use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_LAG: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadLagEvent {
    pub true_change_index: usize,
    pub lag: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadLagReport {
    pub events: Vec<LeadLagEvent>,
    pub summary: IntegerSummary,
    /// lag -> count, covering every lag in [-max_lag, max_lag].
    pub histogram: BTreeMap<i64, usize>,
    pub undetected: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeadLagOutcome {
    Detected(LeadLagReport),
    /// No mispredicted change point could be matched inside the window.
    /// `undetected` lists the change points that were searched.
    NoEvents { undetected: Vec<usize> },
}

impl LeadLagOutcome {
    pub fn events(&self) -> &[LeadLagEvent] {
        match self {
            LeadLagOutcome::Detected(report) => &report.events,
            LeadLagOutcome::NoEvents { .. } => &[],
        }
    }
}

pub fn analyze_lead_lag(
    truth: &[Signal],
    predicted: &[Signal],
    max_lag: usize,
) -> Result<LeadLagOutcome, SigbenchError> {
    check_pair(truth, predicted)?;
    if max_lag == 0 {
        return Err(SigbenchError::invalid_parameter(
            "max_lag",
            "must be at least 1",
        ));
    }

    let mut events = Vec::new();
    let mut undetected = Vec::new();

    for i in 1..truth.len() {
        let target = truth[i];
        if target == truth[i - 1] || predicted[i] == target {
            continue;
        }
        match find_transition(predicted, i, target, max_lag) {
            Some(lag) => events.push(LeadLagEvent {
                true_change_index: i,
                lag,
            }),
            None => undetected.push(i),
        }
    }

    let lags: Vec<i64> = events.iter().map(|e| e.lag).collect();
    let Some(summary) = IntegerSummary::from_values(&lags) else {
        return Ok(LeadLagOutcome::NoEvents { undetected });
    };

    let bound = max_lag as i64;
    let mut bins: BTreeMap<i64, usize> = (-bound..=bound).map(|lag| (lag, 0)).collect();
    bins.extend(histogram(&lags));

    Ok(LeadLagOutcome::Detected(LeadLagReport {
        events,
        summary,
        histogram: bins,
        undetected,
    }))
}

fn find_transition(predicted: &[Signal], i: usize, target: Signal, max_lag: usize) -> Option<i64> {
    let bound = max_lag as i64;
    let origin = i as i64;
    (-bound..=bound).find(|&lag| {
        let j = origin + lag;
        if j < 0 || j >= predicted.len() as i64 {
            return false;
        }
        let j = j as usize;
        predicted[j] == target && (j == 0 || predicted[j - 1] != target)
    })
}
