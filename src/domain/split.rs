//! Order-preserving train/test partitioning.
//!
//! Splitters only ever hand out index ranges where every test index is later
//! than every train index; nothing is shuffled.

use crate::domain::error::SigbenchError;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Materialized partition of a feature/label dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit<X, Y> {
    pub x_train: Vec<X>,
    pub x_test: Vec<X>,
    pub y_train: Vec<Y>,
    pub y_test: Vec<Y>,
}

impl Partition {
    pub fn apply<X: Clone, Y: Clone>(&self, x: &[X], y: &[Y]) -> TrainTestSplit<X, Y> {
        TrainTestSplit {
            x_train: x[self.train.clone()].to_vec(),
            x_test: x[self.test.clone()].to_vec(),
            y_train: y[self.train.clone()].to_vec(),
            y_test: y[self.test.clone()].to_vec(),
        }
    }
}

/// Produces one or more partitions of a series of `len` rows.
pub trait Splitter {
    fn partitions(&self, len: usize) -> Result<Vec<Partition>, SigbenchError>;
}

/// Single chronological split: the first `floor(n * (1 - f))` rows train, the
/// rest test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalSplitter {
    pub test_fraction: f64,
}

impl TemporalSplitter {
    pub fn new(test_fraction: f64) -> Self {
        Self { test_fraction }
    }

    pub fn partition(&self, len: usize) -> Result<Partition, SigbenchError> {
        let f = self.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(SigbenchError::invalid_parameter(
                "test_fraction",
                format!("must lie strictly between 0 and 1, got {f}"),
            ));
        }
        let split_index = (len as f64 * (1.0 - f)).floor() as usize;
        if split_index == 0 || split_index >= len {
            return Err(SigbenchError::invalid_parameter(
                "test_fraction",
                format!(
                    "{len} rows with test fraction {f} leave an empty {} partition",
                    if split_index == 0 { "train" } else { "test" }
                ),
            ));
        }
        Ok(Partition {
            train: 0..split_index,
            test: split_index..len,
        })
    }

    pub fn split<X: Clone, Y: Clone>(
        &self,
        x: &[X],
        y: &[Y],
    ) -> Result<TrainTestSplit<X, Y>, SigbenchError> {
        check_aligned(x.len(), y.len())?;
        Ok(self.partition(x.len())?.apply(x, y))
    }
}

impl Splitter for TemporalSplitter {
    fn partitions(&self, len: usize) -> Result<Vec<Partition>, SigbenchError> {
        Ok(vec![self.partition(len)?])
    }
}

/// Walk-forward windows: `window` train rows followed by `test_size` test
/// rows, advancing by `step` until the test block would run past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindowSplitter {
    pub window: usize,
    pub test_size: usize,
    pub step: usize,
}

impl Splitter for RollingWindowSplitter {
    fn partitions(&self, len: usize) -> Result<Vec<Partition>, SigbenchError> {
        for (name, value) in [
            ("window", self.window),
            ("test_size", self.test_size),
            ("step", self.step),
        ] {
            if value == 0 {
                return Err(SigbenchError::invalid_parameter(name, "must be positive"));
            }
        }
        let span = self.window + self.test_size;
        if span > len {
            return Err(SigbenchError::invalid_parameter(
                "window",
                format!("window {} + test {} exceeds {len} rows", self.window, self.test_size),
            ));
        }

        Ok((0..=len - span)
            .step_by(self.step)
            .map(|start| Partition {
                train: start..start + self.window,
                test: start + self.window..start + span,
            })
            .collect())
    }
}

fn check_aligned(x_len: usize, y_len: usize) -> Result<(), SigbenchError> {
    if x_len != y_len {
        return Err(SigbenchError::invalid_parameter(
            "y",
            format!("features have {x_len} rows but labels have {y_len}"),
        ));
    }
    Ok(())
}

/// Free-function form of [`TemporalSplitter::split`].
pub fn split<X: Clone, Y: Clone>(
    x: &[X],
    y: &[Y],
    test_fraction: f64,
) -> Result<TrainTestSplit<X, Y>, SigbenchError> {
    TemporalSplitter::new(test_fraction).split(x, y)
}
