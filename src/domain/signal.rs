//! Signal values and the column table that carries them between stages.
//!
//! A [`SignalTable`] is the in-memory form of a persisted signal or backtest
//! file: named, equally long `f64` columns in insertion order. Undefined cells
//! (e.g. the first bar's return) are stored as `NaN`.

use crate::domain::error::SigbenchError;

/// Discrete trading signal: `-1`, `0` or `1` in multiclass mode, `0`/`1` in
/// binary mode.
pub type Signal = i8;

pub const TRUE_SIGNAL: &str = "true_signal";
pub const PREDICTED_SIGNAL: &str = "predicted_signal";
pub const CLOSE: &str = "close";
pub const MARKET_RETURN: &str = "market_return";
pub const STRATEGY_RETURN: &str = "strategy_return";
pub const CUM_STRATEGY_RETURN: &str = "cum_strategy_return";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalTable {
    columns: Vec<(String, Vec<f64>)>,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SignalTable::insert`].
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self, SigbenchError> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// Adds or replaces a column. Every column must have the table's length.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> Result<(), SigbenchError> {
        let expected = self
            .columns
            .iter()
            .find(|(n, _)| n != name)
            .map(|(_, v)| v.len());
        if let Some(len) = expected.filter(|&len| len != values.len()) {
            return Err(SigbenchError::invalid_parameter(
                name,
                format!("column has {} rows, table has {}", values.len(), len),
            ));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    pub fn insert_signals(&mut self, name: &str, values: &[Signal]) -> Result<(), SigbenchError> {
        self.insert(name, values.iter().map(|&s| f64::from(s)).collect())
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], SigbenchError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| SigbenchError::missing_column(name))
    }

    /// Reads a column as discrete signals; every cell must be an integral
    /// value representable as a [`Signal`].
    pub fn signal_column(&self, name: &str) -> Result<Vec<Signal>, SigbenchError> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                to_signal(value).ok_or_else(|| SigbenchError::InvalidSignal {
                    column: name.to_string(),
                    index,
                    value,
                })
            })
            .collect()
    }

    /// Row `index` as `(column, value)` pairs, in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(move |(n, v)| (n.as_str(), v[index]))
    }
}

fn to_signal(value: f64) -> Option<Signal> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < f64::from(Signal::MIN) || value > f64::from(Signal::MAX) {
        return None;
    }
    Some(value as Signal)
}

/// Resolves the `true`/`predicted` pair every diagnostic consumes, failing on
/// the first absent column and on an empty table.
pub fn signal_pair(
    table: &SignalTable,
    true_col: &str,
    pred_col: &str,
) -> Result<(Vec<Signal>, Vec<Signal>), SigbenchError> {
    let truth = table.signal_column(true_col)?;
    let predicted = table.signal_column(pred_col)?;
    if truth.is_empty() {
        return Err(SigbenchError::empty_series("signal table has no rows"));
    }
    Ok((truth, predicted))
}
