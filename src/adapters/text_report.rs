//! Plain-text rendering of analysis results for the console.

use crate::domain::analysis::AnalysisReport;
use crate::domain::diagnostics::distribution::{AverageMetrics, DistributionReport};
use crate::domain::diagnostics::error_magnitude::ErrorMagnitudeReport;
use crate::domain::diagnostics::lead_lag::LeadLagOutcome;
use crate::domain::diagnostics::run_length::RunLengthReport;
use crate::domain::diagnostics::summary::IntegerSummary;
use crate::domain::metrics::FinancialMetrics;
use crate::domain::signal::Signal;
use std::collections::BTreeMap;

pub fn render(report: &AnalysisReport) -> String {
    match report {
        AnalysisReport::Distribution(r) => render_distribution(r),
        AnalysisReport::Mae(r) => render_error_magnitude(r),
        AnalysisReport::RunLength(r) => render_run_length(r),
        AnalysisReport::LeadLag(r) => render_lead_lag(r),
        AnalysisReport::FinancialMetrics(m) => render_financial_metrics(m),
    }
}

pub fn render_financial_metrics(m: &FinancialMetrics) -> String {
    let mut out = String::new();
    out.push_str("=== Financial Metrics ===\n");
    out.push_str(&format!("Periods:              {}\n", m.periods));
    out.push_str(&format!("Mean Strategy Return: {:.6}\n", m.mean_strategy_return));
    out.push_str(&format!("Mean Market Return:   {:.6}\n", m.mean_market_return));
    out.push_str(&format!("Final Cumulative:     {:.4}\n", m.final_cumulative_return));
    out.push_str(&format!("Total Return:         {:.2}%\n", m.total_return * 100.0));
    out.push_str(&format!("Market Cumulative:    {:.4}\n", m.market_cumulative_return));
    out.push_str(&format!("Sharpe Ratio:         {:.4}\n", m.sharpe_ratio));
    out.push_str(&format!("Max Drawdown:         -{:.1}%\n", m.max_drawdown * 100.0));
    out
}

fn render_counts(out: &mut String, title: &str, counts: &BTreeMap<Signal, usize>) {
    out.push_str(&format!("{title}:\n"));
    for (value, count) in counts {
        out.push_str(&format!("  {value:>2}: {count}\n"));
    }
}

fn render_average(out: &mut String, label: &str, avg: &AverageMetrics) {
    out.push_str(&format!(
        "  {:<12} {:>9.3} {:>9.3} {:>9.3} {:>9}\n",
        label, avg.precision, avg.recall, avg.f1, avg.support
    ));
}

pub fn render_distribution(r: &DistributionReport) -> String {
    let mut out = String::new();
    out.push_str("=== Signal Distribution ===\n");
    render_counts(&mut out, "True", &r.true_counts);
    render_counts(&mut out, "Predicted", &r.predicted_counts);

    out.push_str("\n=== Classification Report ===\n");
    out.push_str(&format!(
        "  {:<12} {:>9} {:>9} {:>9} {:>9}\n",
        "class", "precision", "recall", "f1", "support"
    ));
    for c in &r.report.classes {
        out.push_str(&format!(
            "  {:<12} {:>9.3} {:>9.3} {:>9.3} {:>9}\n",
            c.class, c.precision, c.recall, c.f1, c.support
        ));
    }
    render_average(&mut out, "macro avg", &r.report.macro_avg);
    render_average(&mut out, "weighted avg", &r.report.weighted_avg);
    out.push_str(&format!("Accuracy: {:.3}\n", r.report.accuracy));

    out.push_str("\n=== Confusion Matrix (rows true, cols predicted) ===\n");
    out.push_str("      ");
    for label in r.confusion.labels {
        out.push_str(&format!("{label:>6}"));
    }
    out.push('\n');
    for (label, row) in r.confusion.labels.iter().zip(r.confusion.counts.iter()) {
        out.push_str(&format!("{label:>6}"));
        for count in row {
            out.push_str(&format!("{count:>6}"));
        }
        out.push('\n');
    }
    out
}

pub fn render_error_magnitude(r: &ErrorMagnitudeReport) -> String {
    let max = r.abs_errors.iter().copied().fold(0.0, f64::max);
    let misses = r.abs_errors.iter().filter(|&&e| e > 0.0).count();
    let mut out = String::new();
    out.push_str("=== Error Magnitude ===\n");
    out.push_str(&format!("MAE:        {:.4}\n", r.mae));
    out.push_str(&format!("Max Error:  {max}\n"));
    out.push_str(&format!("Bars Wrong: {} of {}\n", misses, r.abs_errors.len()));
    out
}

fn render_summary(out: &mut String, s: &IntegerSummary) {
    out.push_str(&format!(
        "  count {}, mean {:.2}, median {:.1}, mode {}, min {}, max {}\n",
        s.count, s.mean, s.median, s.mode, s.min, s.max
    ));
}

pub fn render_run_length(r: &RunLengthReport) -> String {
    let mut out = String::new();
    out.push_str("=== Run Length ===\n");
    out.push_str(&format!("Runs: {}\n", r.runs.len()));
    for (value, stats) in &r.per_value {
        out.push_str(&format!("\nValue {value}:\n"));
        render_summary(&mut out, &stats.summary);
        for (length, count) in &stats.histogram {
            out.push_str(&format!("  length {length:>4}: {count}\n"));
        }
    }
    out
}

pub fn render_lead_lag(outcome: &LeadLagOutcome) -> String {
    let mut out = String::new();
    out.push_str("=== Lead/Lag ===\n");
    match outcome {
        LeadLagOutcome::NoEvents { undetected } => {
            out.push_str("No lead/lag events detected.\n");
            out.push_str(&format!("Undetected change points: {}\n", undetected.len()));
        }
        LeadLagOutcome::Detected(report) => {
            out.push_str(&format!("Events: {}\n", report.events.len()));
            render_summary(&mut out, &report.summary);
            out.push_str(&format!("Undetected change points: {}\n", report.undetected.len()));
            out.push_str("Histogram (positive = model late):\n");
            for (lag, count) in report.histogram.iter().filter(|(_, c)| **c > 0) {
                out.push_str(&format!("  lag {lag:>+4}: {count}\n"));
            }
        }
    }
    out
}
