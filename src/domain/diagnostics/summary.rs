//! Location statistics over integer observations (run lengths, lags).

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; ties go to the value seen first.
    pub mode: i64,
    pub min: i64,
    pub max: i64,
}

impl IntegerSummary {
    /// `None` for an empty slice.
    pub fn from_values(values: &[i64]) -> Option<Self> {
        let (&min, &max) = (values.iter().min()?, values.iter().max()?);
        let count = values.len();
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        } else {
            sorted[mid] as f64
        };

        Some(Self {
            count,
            mean,
            median,
            mode: first_mode(values)?,
            min,
            max,
        })
    }
}

fn first_mode(values: &[i64]) -> Option<i64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let top = counts.values().copied().max()?;
    values.iter().copied().find(|v| counts[v] == top)
}

/// Occurrences of each distinct value, ascending by value.
pub fn histogram(values: &[i64]) -> BTreeMap<i64, usize> {
    let mut bins = BTreeMap::new();
    for &v in values {
        *bins.entry(v).or_insert(0) += 1;
    }
    bins
}
