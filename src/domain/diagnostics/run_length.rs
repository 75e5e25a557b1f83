//! Run-length structure of a signal series.
//!
//! Encoding is a single left-to-right scan: a new run starts whenever a value
//! differs from its predecessor. Run lengths always sum to the input length.

use super::summary::{histogram, IntegerSummary};
use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<T> {
    pub value: T,
    pub length: usize,
    pub start_index: usize,
}

pub fn encode<T: Copy + PartialEq>(values: &[T]) -> Vec<Run<T>> {
    let mut runs: Vec<Run<T>> = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.value == v => run.length += 1,
            _ => runs.push(Run {
                value: v,
                length: 1,
                start_index: i,
            }),
        }
    }
    runs
}

pub fn decode<T: Copy>(runs: &[Run<T>]) -> Vec<T> {
    runs.iter()
        .flat_map(|r| std::iter::repeat_n(r.value, r.length))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueRunStats {
    /// run length -> number of runs with that length
    pub histogram: BTreeMap<i64, usize>,
    pub summary: IntegerSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLengthReport {
    pub runs: Vec<Run<Signal>>,
    /// Keyed by signal value, ascending.
    pub per_value: BTreeMap<Signal, ValueRunStats>,
}

pub fn analyze_run_length(values: &[Signal]) -> Result<RunLengthReport, SigbenchError> {
    if values.is_empty() {
        return Err(SigbenchError::empty_series(
            "run-length analysis needs at least one signal",
        ));
    }

    let runs = encode(values);

    let mut lengths: BTreeMap<Signal, Vec<i64>> = BTreeMap::new();
    for run in &runs {
        lengths.entry(run.value).or_default().push(run.length as i64);
    }

    let per_value = lengths
        .into_iter()
        .filter_map(|(value, lens)| {
            let summary = IntegerSummary::from_values(&lens)?;
            Some((
                value,
                ValueRunStats {
                    histogram: histogram(&lens),
                    summary,
                },
            ))
        })
        .collect();

    Ok(RunLengthReport { runs, per_value })
}
