//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::baseline_model::{build_model, ModelParams};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_signal_adapter::{write_table, CsvSignalReader, CsvSignalWriter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::analysis::{run_analysis, AnalysisKind, AnalysisParams};
use crate::domain::backtest::{run_on_table, BacktestConfig};
use crate::domain::config_validation::{parse_value, validate_pipeline_config};
use crate::domain::diagnostics::lead_lag::DEFAULT_MAX_LAG;
use crate::domain::error::SigbenchError;
use crate::domain::label::{LabelMode, LabelParams};
use crate::domain::ohlcv::PriceField;
use crate::domain::pipeline::{run_pipeline, PipelineConfig, DEFAULT_TEST_SIZE};
use crate::domain::signal::{PREDICTED_SIGNAL, TRUE_SIGNAL};
use crate::ports::config_port::ConfigPort;
use crate::ports::model_port::ForecastModel;
use crate::ports::signal_port::SignalSource;

#[derive(Parser, Debug)]
#[command(name = "sigbench", about = "Trading signal evaluation and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label, split, fit, predict, evaluate and backtest one symbol
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run one analysis over a persisted signal or backtest file
    Analyze {
        /// distribution, mae, run_length, lead_lag or financial_metrics
        #[arg(short, long)]
        kind: String,
        #[arg(short, long)]
        signals: PathBuf,
        #[arg(long, default_value = TRUE_SIGNAL)]
        true_column: String,
        #[arg(long, default_value = PREDICTED_SIGNAL)]
        pred_column: String,
        /// Column encoded by the run_length analysis; defaults to --pred-column
        #[arg(long)]
        column: Option<String>,
        #[arg(long, default_value_t = DEFAULT_MAX_LAG)]
        max_lag: usize,
    },
    /// Backtest a persisted signal file against its close column
    Backtest {
        #[arg(short, long)]
        signals: PathBuf,
        #[arg(long, default_value = PREDICTED_SIGNAL)]
        signal_column: String,
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        /// Write the per-bar backtest table here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a pipeline configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), SigbenchError> {
    match cli.command {
        Command::Run { config } => run_full_pipeline(&config),
        Command::Analyze {
            kind,
            signals,
            true_column,
            pred_column,
            column,
            max_lag,
        } => {
            let params = AnalysisParams {
                run_col: column.unwrap_or_else(|| pred_column.clone()),
                true_col: true_column,
                pred_col: pred_column,
                max_lag,
            };
            run_analyze(&kind, &signals, &params)
        }
        Command::Backtest {
            signals,
            signal_column,
            cost,
            output,
        } => run_backtest(&signals, &signal_column, cost, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, SigbenchError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_pipeline_config(&adapter)?;
    Ok(adapter)
}

fn config_invalid(section: &str, key: &str, err: SigbenchError) -> SigbenchError {
    SigbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: err.to_string(),
    }
}

pub fn build_pipeline_config(adapter: &dyn ConfigPort) -> Result<PipelineConfig, SigbenchError> {
    let symbol = adapter
        .get_string("data", "symbol")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SigbenchError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })?;

    let defaults = LabelParams::default();
    let target: PriceField = adapter
        .get_string_or("label", "target", "close")
        .parse()
        .map_err(|e| config_invalid("label", "target", e))?;
    let mode: LabelMode = adapter
        .get_string_or("label", "mode", "multiclass")
        .parse()
        .map_err(|e| config_invalid("label", "mode", e))?;

    Ok(PipelineConfig {
        symbol,
        label: LabelParams {
            horizon: parse_value(adapter, "label", "horizon")?.unwrap_or(defaults.horizon),
            threshold: parse_value(adapter, "label", "threshold")?.unwrap_or(defaults.threshold),
            target,
            mode,
        },
        test_size: parse_value(adapter, "split", "test_size")?.unwrap_or(DEFAULT_TEST_SIZE),
        backtest: BacktestConfig {
            cost: parse_value(adapter, "backtest", "cost")?.unwrap_or(0.0),
        },
        max_lag: parse_value(adapter, "analysis", "max_lag")?.unwrap_or(DEFAULT_MAX_LAG),
    })
}

pub fn build_configured_model(
    adapter: &dyn ConfigPort,
    mode: LabelMode,
) -> Result<Box<dyn ForecastModel>, SigbenchError> {
    let params = ModelParams {
        momentum_threshold: parse_value(adapter, "model", "momentum_threshold")?.unwrap_or(0.0),
        mode,
    };
    build_model(&adapter.get_string_or("model", "name", "majority"), &params)
        .map_err(|e| config_invalid("model", "name", e))
}

/// Configured run id, or the current UTC time as `YYYYMMDD_HHMMSS`.
pub fn resolve_run_id(adapter: &dyn ConfigPort) -> String {
    adapter
        .get_string("output", "run_id")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Utc::now().format("%Y%m%d_%H%M%S").to_string())
}

fn run_full_pipeline(config_path: &Path) -> Result<(), SigbenchError> {
    let adapter = load_config(config_path)?;
    let config = build_pipeline_config(&adapter)?;
    let mut model = build_configured_model(&adapter, config.label.mode)?;

    let source = CsvAdapter::new(PathBuf::from(adapter.get_string_or("data", "dir", "data")));
    let writer = CsvSignalWriter::new(PathBuf::from(
        adapter.get_string_or("output", "dir", "outputs"),
    ));
    let run_id = resolve_run_id(&adapter);

    let outcome = run_pipeline(&source, model.as_mut(), &writer, &config, &run_id)?;

    println!("Run:      {}", outcome.run_id);
    println!("Rows:     {} train, {} test", outcome.train_rows, outcome.test_rows);
    println!("Accuracy: {:.3}", outcome.classification.accuracy);
    println!("Macro F1: {:.3}", outcome.classification.macro_avg.f1);
    println!();
    print!("{}", text_report::render_financial_metrics(&outcome.financial));
    println!();
    print!("{}", text_report::render_lead_lag(&outcome.timing));
    println!();
    println!("Signals:  {}", outcome.signals_path.display());
    println!("Metrics:  {}", outcome.metrics_path.display());
    println!("Backtest: {}", outcome.backtest_path.display());
    Ok(())
}

fn run_analyze(kind: &str, signals: &Path, params: &AnalysisParams) -> Result<(), SigbenchError> {
    // Reject an unknown analysis before touching the file.
    let kind: AnalysisKind = kind.parse()?;
    let table = CsvSignalReader.read_table(signals)?;
    info!(kind = %kind, rows = table.len(), path = %signals.display(), "running analysis");

    let report = run_analysis(kind, &table, params)?;
    print!("{}", text_report::render(&report));
    Ok(())
}

fn run_backtest(
    signals: &Path,
    signal_column: &str,
    cost: f64,
    output: Option<&Path>,
) -> Result<(), SigbenchError> {
    let table = CsvSignalReader.read_table(signals)?;
    info!(rows = table.len(), column = signal_column, cost, "running backtest");
    let result = run_on_table(&table, signal_column, &BacktestConfig { cost })?;
    print!("{}", text_report::render_financial_metrics(&result.metrics));

    if let Some(path) = output {
        write_table(path, &result.to_table(&table)?)?;
        info!(path = %path.display(), "backtest table written");
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigbenchError> {
    let adapter = load_config(config_path)?;
    let config = build_pipeline_config(&adapter)?;
    let model = build_configured_model(&adapter, config.label.mode)?;
    println!(
        "Configuration valid: symbol {}, model {}, horizon {}, test_size {}",
        config.symbol,
        model.name(),
        config.label.horizon,
        config.test_size
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn pipeline_config_uses_defaults() {
        let config = build_pipeline_config(&adapter("[data]\nsymbol = ETH/USDT\n")).unwrap();
        assert_eq!(config.symbol, "ETH/USDT");
        assert_eq!(config.label, LabelParams::default());
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.backtest.cost, 0.0);
        assert_eq!(config.max_lag, DEFAULT_MAX_LAG);
    }

    #[test]
    fn pipeline_config_reads_overrides() {
        let config = build_pipeline_config(&adapter(
            "[data]\nsymbol = X\n[label]\nhorizon = 3\nthreshold = 0\ntarget = open\nmode = binary\n[split]\ntest_size = 0.4\n[backtest]\ncost = 0.001\n",
        ))
        .unwrap();
        assert_eq!(config.label.horizon, 3);
        assert_eq!(config.label.threshold, 0.0);
        assert_eq!(config.label.target, PriceField::Open);
        assert_eq!(config.label.mode, LabelMode::Binary);
        assert_eq!(config.test_size, 0.4);
        assert_eq!(config.backtest.cost, 0.001);
    }

    #[test]
    fn missing_symbol_is_config_error() {
        let err = build_pipeline_config(&adapter("[label]\nhorizon = 2\n")).unwrap_err();
        assert!(matches!(err, SigbenchError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn unknown_model_is_config_error() {
        let err = build_configured_model(&adapter("[model]\nname = xgboost\n"), LabelMode::Binary)
            .err()
            .unwrap();
        assert!(matches!(err, SigbenchError::ConfigInvalid { section, .. } if section == "model"));
    }

    #[test]
    fn analyze_column_options_default_to_signal_columns() {
        let cli = Cli::parse_from(["sigbench", "analyze", "--kind", "mae", "--signals", "s.csv"]);
        let Command::Analyze {
            true_column,
            pred_column,
            column,
            ..
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(true_column, TRUE_SIGNAL);
        assert_eq!(pred_column, PREDICTED_SIGNAL);
        assert_eq!(column, None);
    }

    #[test]
    fn run_id_from_config_or_clock() {
        assert_eq!(resolve_run_id(&adapter("[output]\nrun_id = abc\n")), "abc");
        let generated = resolve_run_id(&adapter("[output]\n"));
        assert_eq!(generated.len(), 15);
        assert_eq!(generated.as_bytes()[8], b'_');
    }
}
