//! Signal distribution, per-class classification metrics and the confusion
//! matrix.
//!
//! Per-class metrics follow the usual one-vs-rest definitions; a ratio with a
//! zero denominator is reported as 0.

use super::check_pair;
use crate::domain::error::SigbenchError;
use crate::domain::signal::Signal;
use std::collections::{BTreeMap, BTreeSet};

/// Row/column order of [`ConfusionMatrix`], independent of the data.
pub const CONFUSION_LABELS: [Signal; 3] = [-1, 0, 1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub labels: [Signal; 3],
    /// `counts[t][p]`: bars with true label `labels[t]` predicted as `labels[p]`.
    pub counts: [[usize; 3]; 3],
}

impl ConfusionMatrix {
    /// Pairs whose labels fall outside [`CONFUSION_LABELS`] are not counted.
    pub fn compute(truth: &[Signal], predicted: &[Signal]) -> Self {
        let mut counts = [[0usize; 3]; 3];
        let index = |s: Signal| CONFUSION_LABELS.iter().position(|&l| l == s);
        for (&t, &p) in truth.iter().zip(predicted) {
            if let (Some(row), Some(col)) = (index(t), index(p)) {
                counts[row][col] += 1;
            }
        }
        Self {
            labels: CONFUSION_LABELS,
            counts,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class: Signal,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// One entry per class present in either series, ascending.
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    pub fn compute(truth: &[Signal], predicted: &[Signal]) -> Result<Self, SigbenchError> {
        check_pair(truth, predicted)?;

        let classes: BTreeSet<Signal> = truth.iter().chain(predicted).copied().collect();
        let per_class: Vec<ClassMetrics> = classes
            .iter()
            .map(|&class| class_metrics(class, truth, predicted))
            .collect();

        let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
        let accuracy = correct as f64 / truth.len() as f64;

        let n_classes = per_class.len() as f64;
        let total_support: usize = per_class.iter().map(|c| c.support).sum();
        let macro_avg = AverageMetrics {
            precision: per_class.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: per_class.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: per_class.iter().map(|c| c.f1).sum::<f64>() / n_classes,
            support: total_support,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total_support == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|c| f(c) * c.support as f64)
                    .sum::<f64>()
                    / total_support as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c: &ClassMetrics| c.precision),
            recall: weight(|c: &ClassMetrics| c.recall),
            f1: weight(|c: &ClassMetrics| c.f1),
            support: total_support,
        };

        Ok(Self {
            classes: per_class,
            accuracy,
            macro_avg,
            weighted_avg,
        })
    }

    pub fn class(&self, class: Signal) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.class == class)
    }
}

fn class_metrics(class: Signal, truth: &[Signal], predicted: &[Signal]) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in truth.iter().zip(predicted) {
        match (t == class, p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        class,
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub fn value_counts(values: &[Signal]) -> BTreeMap<Signal, usize> {
    let mut counts = BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionReport {
    pub true_counts: BTreeMap<Signal, usize>,
    pub predicted_counts: BTreeMap<Signal, usize>,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

pub fn analyze_distribution(
    truth: &[Signal],
    predicted: &[Signal],
) -> Result<DistributionReport, SigbenchError> {
    let report = ClassificationReport::compute(truth, predicted)?;
    Ok(DistributionReport {
        true_counts: value_counts(truth),
        predicted_counts: value_counts(predicted),
        report,
        confusion: ConfusionMatrix::compute(truth, predicted),
    })
}
