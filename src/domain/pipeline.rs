//! End-to-end run: load, label, split, fit, predict, persist, evaluate and
//! backtest one symbol.
//!
//! Bars without a label (the last `horizon` bars, and bars with a zero
//! reference price) are dropped before the split, so the model never sees
//! a row whose target is unknown. The model is fit on the train partition
//! only; everything written to disk covers the test partition.
//!
//! The backtest covers every bar between the first and last test row, so an
//! unlabelled bar inside that range still moves the equity curve. No file is
//! written until every evaluation step has succeeded.

use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::diagnostics::distribution::ClassificationReport;
use crate::domain::diagnostics::lead_lag::{analyze_lead_lag, LeadLagOutcome};
use crate::domain::error::SigbenchError;
use crate::domain::label::{LabelGenerator, LabelParams, PriceDirectionLabeler};
use crate::domain::metrics::FinancialMetrics;
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use crate::domain::signal::{self, Signal, SignalTable, PREDICTED_SIGNAL, TRUE_SIGNAL};
use crate::domain::split::TemporalSplitter;
use crate::ports::model_port::{predict_aligned, FeatureRow, ForecastModel};
use crate::ports::price_port::PriceSource;
use crate::ports::signal_port::{OutputKind, SignalWriter};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_TEST_SIZE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub symbol: String,
    pub label: LabelParams,
    pub test_size: f64,
    pub backtest: BacktestConfig,
    /// Search window for the timing diagnostic on the test partition.
    pub max_lag: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub signals_path: PathBuf,
    pub metrics_path: PathBuf,
    pub backtest_path: PathBuf,
    pub classification: ClassificationReport,
    pub financial: FinancialMetrics,
    pub timing: LeadLagOutcome,
}

struct LabelledRow<'a> {
    /// Position of the bar in the loaded series.
    index: usize,
    bar: &'a OhlcvBar,
    label: Signal,
}

const FEATURE_FIELDS: [PriceField; 5] = [
    PriceField::Open,
    PriceField::High,
    PriceField::Low,
    PriceField::Close,
    PriceField::Volume,
];

fn feature_row(bar: &OhlcvBar) -> FeatureRow {
    FEATURE_FIELDS.iter().map(|&f| bar.field(f)).collect()
}

pub fn run_pipeline(
    source: &dyn PriceSource,
    model: &mut dyn ForecastModel,
    writer: &dyn SignalWriter,
    config: &PipelineConfig,
    run_id: &str,
) -> Result<PipelineOutcome, SigbenchError> {
    info!(symbol = %config.symbol, "loading prices");
    let prices = source.load_prices(&config.symbol)?;
    info!(bars = prices.len(), "prices loaded");

    let labels = PriceDirectionLabeler::new(config.label).generate(&prices)?;
    let bars = prices.bars();
    let rows: Vec<LabelledRow<'_>> = bars
        .iter()
        .zip(&labels)
        .enumerate()
        .filter_map(|(index, (bar, label))| label.map(|label| LabelledRow { index, bar, label }))
        .collect();
    debug!(
        labelled = rows.len(),
        dropped = prices.len() - rows.len(),
        "labels generated"
    );

    let features: Vec<FeatureRow> = rows.iter().map(|r| feature_row(r.bar)).collect();
    let targets: Vec<Signal> = rows.iter().map(|r| r.label).collect();

    let partition = TemporalSplitter::new(config.test_size).partition(rows.len())?;
    let split = partition.apply(&features, &targets);
    let test_rows = &rows[partition.test.clone()];
    info!(
        train = split.x_train.len(),
        test = split.x_test.len(),
        "temporal split"
    );

    // The backtest walks every bar the test rows span, labelled or not, so a
    // zero price inside the range is skipped rather than bridged.
    let span = match (test_rows.first(), test_rows.last()) {
        (Some(first), Some(last)) => first.index..last.index + 1,
        _ => return Err(SigbenchError::empty_series("test partition has no rows")),
    };
    let test_bars = &bars[span.clone()];
    if test_bars.len() > test_rows.len() {
        debug!(
            unlabelled = test_bars.len() - test_rows.len(),
            "unlabelled bars inside test range"
        );
    }

    info!(model = model.name(), "fitting model");
    model.fit(&split.x_train, &split.y_train)?;
    let bar_features: Vec<FeatureRow> = test_bars.iter().map(feature_row).collect();
    let bar_predictions = predict_aligned(&*model, &bar_features)?;
    let predicted: Vec<Signal> = test_rows
        .iter()
        .map(|r| bar_predictions[r.index - span.start])
        .collect();

    // Everything that can fail runs before the first file is written.
    let classification = ClassificationReport::compute(&split.y_test, &predicted)?;
    let timing = analyze_lead_lag(&split.y_test, &predicted, config.max_lag)?;
    debug!(events = timing.events().len(), "lead/lag scanned");

    let closes: Vec<f64> = test_bars.iter().map(|b| b.close).collect();
    let result = run_backtest(&bar_predictions, &closes, &config.backtest)?;

    let row_bars: Vec<&OhlcvBar> = test_rows.iter().map(|r| r.bar).collect();
    let row_truth: Vec<Option<Signal>> = split.y_test.iter().copied().map(Some).collect();
    let signals = bar_table(&row_bars, &predicted, &row_truth)?;
    let metrics = SignalTable::new()
        .with_column("accuracy", vec![classification.accuracy])?
        .with_column("f1", vec![classification.macro_avg.f1])?
        .with_column("precision", vec![classification.macro_avg.precision])?
        .with_column("recall", vec![classification.macro_avg.recall])?;
    let span_bars: Vec<&OhlcvBar> = test_bars.iter().collect();
    let backtest_table =
        result.to_table(&bar_table(&span_bars, &bar_predictions, &labels[span])?)?;

    let model_name = model.name().to_string();
    let signals_path = writer.write(OutputKind::Signals, &signals, &model_name, run_id)?;
    let metrics_path = writer.write(OutputKind::Metrics, &metrics, &model_name, run_id)?;
    let backtest_path =
        writer.write(OutputKind::Backtest, &backtest_table, &model_name, run_id)?;
    info!(
        signals = %signals_path.display(),
        metrics = %metrics_path.display(),
        backtest = %backtest_path.display(),
        accuracy = classification.accuracy,
        cumulative = result.metrics.final_cumulative_return,
        "evaluation written"
    );

    Ok(PipelineOutcome {
        run_id: run_id.to_string(),
        train_rows: split.x_train.len(),
        test_rows: split.x_test.len(),
        signals_path,
        metrics_path,
        backtest_path,
        classification,
        financial: result.metrics,
        timing,
    })
}

/// Timestamp, OHLCV and both signal columns; an undefined label is written
/// as NaN.
fn bar_table(
    bars: &[&OhlcvBar],
    predicted: &[Signal],
    truth: &[Option<Signal>],
) -> Result<SignalTable, SigbenchError> {
    let column = |f: fn(&OhlcvBar) -> f64| bars.iter().map(|b| f(b)).collect::<Vec<f64>>();
    let mut table = SignalTable::new()
        .with_column(
            "timestamp",
            column(|b| b.timestamp.and_utc().timestamp_millis() as f64),
        )?
        .with_column("open", column(|b| b.open))?
        .with_column("high", column(|b| b.high))?
        .with_column("low", column(|b| b.low))?
        .with_column(signal::CLOSE, column(|b| b.close))?
        .with_column("volume", column(|b| b.volume))?;
    table.insert_signals(PREDICTED_SIGNAL, predicted)?;
    table.insert(
        TRUE_SIGNAL,
        truth.iter().map(|t| t.map_or(f64::NAN, f64::from)).collect(),
    )?;
    Ok(table)
}
