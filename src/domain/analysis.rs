//! Named analyses over a persisted signal or backtest table.
//!
//! Callers pick an [`AnalysisKind`] (parsed, and so validated, before any
//! data is touched) and get one [`AnalysisReport`] back.

use crate::domain::diagnostics::distribution::{analyze_distribution, DistributionReport};
use crate::domain::diagnostics::error_magnitude::{analyze_error_magnitude, ErrorMagnitudeReport};
use crate::domain::diagnostics::lead_lag::{analyze_lead_lag, LeadLagOutcome, DEFAULT_MAX_LAG};
use crate::domain::diagnostics::run_length::{analyze_run_length, RunLengthReport};
use crate::domain::error::SigbenchError;
use crate::domain::metrics::FinancialMetrics;
use crate::domain::signal::{signal_pair, SignalTable, PREDICTED_SIGNAL, TRUE_SIGNAL};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Distribution,
    Mae,
    RunLength,
    LeadLag,
    FinancialMetrics,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::Distribution,
        AnalysisKind::Mae,
        AnalysisKind::RunLength,
        AnalysisKind::LeadLag,
        AnalysisKind::FinancialMetrics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::Distribution => "distribution",
            AnalysisKind::Mae => "mae",
            AnalysisKind::RunLength => "run_length",
            AnalysisKind::LeadLag => "lead_lag",
            AnalysisKind::FinancialMetrics => "financial_metrics",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = SigbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                SigbenchError::invalid_parameter(
                    "analysis",
                    format!("unknown analysis '{}' (expected one of {})", s.trim(), known.join(", ")),
                )
            })
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub true_col: String,
    pub pred_col: String,
    /// Series encoded by the run-length analysis.
    pub run_col: String,
    pub max_lag: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            true_col: TRUE_SIGNAL.to_string(),
            pred_col: PREDICTED_SIGNAL.to_string(),
            run_col: PREDICTED_SIGNAL.to_string(),
            max_lag: DEFAULT_MAX_LAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    Distribution(DistributionReport),
    Mae(ErrorMagnitudeReport),
    RunLength(RunLengthReport),
    LeadLag(LeadLagOutcome),
    FinancialMetrics(FinancialMetrics),
}

pub fn run_analysis(
    kind: AnalysisKind,
    table: &SignalTable,
    params: &AnalysisParams,
) -> Result<AnalysisReport, SigbenchError> {
    match kind {
        AnalysisKind::Distribution => {
            let (truth, pred) = signal_pair(table, &params.true_col, &params.pred_col)?;
            analyze_distribution(&truth, &pred).map(AnalysisReport::Distribution)
        }
        AnalysisKind::Mae => {
            let (truth, pred) = signal_pair(table, &params.true_col, &params.pred_col)?;
            analyze_error_magnitude(&truth, &pred).map(AnalysisReport::Mae)
        }
        AnalysisKind::RunLength => {
            let values = table.signal_column(&params.run_col)?;
            analyze_run_length(&values).map(AnalysisReport::RunLength)
        }
        AnalysisKind::LeadLag => {
            let (truth, pred) = signal_pair(table, &params.true_col, &params.pred_col)?;
            analyze_lead_lag(&truth, &pred, params.max_lag).map(AnalysisReport::LeadLag)
        }
        AnalysisKind::FinancialMetrics => {
            FinancialMetrics::from_table(table).map(AnalysisReport::FinancialMetrics)
        }
    }
}
