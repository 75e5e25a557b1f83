//! Integration tests.
//!
//! Tests cover:
//! - Full pipeline with a mock price source and in-memory writer
//! - Both baseline models through the pipeline
//! - Persisted outputs on disk, read back and analysed
//! - The worked examples for labels, runs, lead/lag, backtest and split

mod common;

use approx::assert_relative_eq;
use common::*;
use sigbench::adapters::baseline_model::{MajorityClassModel, MomentumModel};
use sigbench::adapters::csv_signal_adapter::{CsvSignalReader, CsvSignalWriter};
use sigbench::domain::analysis::{run_analysis, AnalysisKind, AnalysisParams, AnalysisReport};
use sigbench::domain::backtest::{run_backtest, run_on_table, BacktestConfig};
use sigbench::domain::diagnostics::lead_lag::{analyze_lead_lag, LeadLagOutcome, DEFAULT_MAX_LAG};
use sigbench::domain::diagnostics::run_length::encode;
use sigbench::domain::error::SigbenchError;
use sigbench::domain::label::{LabelGenerator, LabelMode, LabelParams, PriceDirectionLabeler};
use sigbench::domain::metrics::FinancialMetrics;
use sigbench::domain::pipeline::{run_pipeline, PipelineConfig};
use sigbench::domain::signal::{CUM_STRATEGY_RETURN, PREDICTED_SIGNAL, TRUE_SIGNAL};
use sigbench::domain::split::split;
use sigbench::ports::signal_port::{OutputKind, SignalSource};

fn pipeline_config(symbol: &str) -> PipelineConfig {
    PipelineConfig {
        symbol: symbol.to_string(),
        label: LabelParams {
            threshold: 0.0,
            ..LabelParams::default()
        },
        test_size: 0.3,
        backtest: BacktestConfig::default(),
        max_lag: DEFAULT_MAX_LAG,
    }
}

mod full_pipeline {
    use super::*;

    #[test]
    fn majority_model_end_to_end() {
        let bars = bars_from_closes(&wave_closes(61));
        let source = MockPriceSource::new().with_bars("BTC/USDT", bars.clone());
        let writer = MemoryWriter::default();
        let mut model = MajorityClassModel::default();

        let outcome = run_pipeline(
            &source,
            &mut model,
            &writer,
            &pipeline_config("BTC/USDT"),
            "run1",
        )
        .unwrap();

        // 61 bars, horizon 1 -> 60 labelled rows -> 42 train / 18 test
        assert_eq!(outcome.train_rows, 42);
        assert_eq!(outcome.test_rows, 18);

        let names: Vec<String> = writer
            .written
            .borrow()
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "signals_majority_run1.csv",
                "metrics_majority_run1.csv",
                "backtest_majority_run1.csv"
            ]
        );

        let signals = writer.table(OutputKind::Signals).unwrap();
        let majority = model.majority().unwrap();
        assert!(signals
            .signal_column(PREDICTED_SIGNAL)
            .unwrap()
            .iter()
            .all(|&s| s == majority));

        // True labels line up with the labeler on the full series.
        let labels = PriceDirectionLabeler::new(pipeline_config("").label)
            .generate(&PriceSeries::new(bars).unwrap())
            .unwrap();
        let expected: Vec<i8> = labels[42..60].iter().map(|l| l.unwrap()).collect();
        assert_eq!(signals.signal_column(TRUE_SIGNAL).unwrap(), expected);
    }

    #[test]
    fn persisted_backtest_reproduces_reported_metrics() {
        let source =
            MockPriceSource::new().with_bars("ETH", bars_from_closes(&wave_closes(40)));
        let writer = MemoryWriter::default();
        let mut model = MomentumModel::new(0.0, LabelMode::Multiclass).unwrap();

        let outcome =
            run_pipeline(&source, &mut model, &writer, &pipeline_config("ETH"), "r").unwrap();

        let backtest = writer.table(OutputKind::Backtest).unwrap();
        let from_table = FinancialMetrics::from_table(&backtest).unwrap();
        assert_relative_eq!(
            from_table.final_cumulative_return,
            outcome.financial.final_cumulative_return,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            from_table.sharpe_ratio,
            outcome.financial.sharpe_ratio,
            epsilon = 1e-9
        );
        assert_eq!(from_table.periods, outcome.test_rows - 1);
    }

    #[test]
    fn momentum_predictions_follow_bar_direction() {
        let source =
            MockPriceSource::new().with_bars("X", bars_from_closes(&wave_closes(30)));
        let writer = MemoryWriter::default();
        let mut model = MomentumModel::new(0.0, LabelMode::Multiclass).unwrap();

        run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "r").unwrap();

        let signals = writer.table(OutputKind::Signals).unwrap();
        let open = signals.column("open").unwrap();
        let close = signals.column("close").unwrap();
        let predicted = signals.signal_column(PREDICTED_SIGNAL).unwrap();
        for i in 0..predicted.len() {
            let expected = if close[i] > open[i] {
                1
            } else if close[i] < open[i] {
                -1
            } else {
                0
            };
            assert_eq!(predicted[i], expected, "row {i}");
        }
    }

    #[test]
    fn metrics_table_holds_macro_scores() {
        let source =
            MockPriceSource::new().with_bars("X", bars_from_closes(&wave_closes(30)));
        let writer = MemoryWriter::default();
        let mut model = MajorityClassModel::default();

        let outcome =
            run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "r").unwrap();

        let metrics = writer.table(OutputKind::Metrics).unwrap();
        let names: Vec<&str> = metrics.column_names().collect();
        assert_eq!(names, vec!["accuracy", "f1", "precision", "recall"]);
        assert_eq!(metrics.len(), 1);
        assert_eq!(
            metrics.column("accuracy").unwrap()[0],
            outcome.classification.accuracy
        );
        assert_eq!(
            metrics.column("f1").unwrap()[0],
            outcome.classification.macro_avg.f1
        );
    }

    #[test]
    fn source_error_stops_before_any_write() {
        let source = MockPriceSource::new().with_error("BAD", "exchange offline");
        let writer = MemoryWriter::default();
        let mut model = MajorityClassModel::default();

        let err = run_pipeline(&source, &mut model, &writer, &pipeline_config("BAD"), "r")
            .unwrap_err();
        assert!(matches!(err, SigbenchError::Data { reason } if reason == "exchange offline"));
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn unordered_source_is_rejected() {
        let mut bars = bars_from_closes(&wave_closes(10));
        bars.swap(3, 4);
        let source = MockPriceSource::new().with_bars("X", bars);
        let writer = MemoryWriter::default();
        let mut model = MajorityClassModel::default();

        let err =
            run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "r").unwrap_err();
        assert!(matches!(err, SigbenchError::UnorderedTimestamps { index: 4 }));
    }

    #[test]
    fn unknown_symbol_has_too_few_bars() {
        let source = MockPriceSource::new();
        let writer = MemoryWriter::default();
        let mut model = MajorityClassModel::default();

        let err = run_pipeline(&source, &mut model, &writer, &pipeline_config("NONE"), "r")
            .unwrap_err();
        assert!(matches!(err, SigbenchError::InvalidParameter { .. }));
    }
}

mod persisted_outputs {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn every_analysis_runs_on_written_files() {
        let dir = TempDir::new().unwrap();
        let source =
            MockPriceSource::new().with_bars("X", bars_from_closes(&wave_closes(80)));
        let writer = CsvSignalWriter::new(dir.path().join("outputs"));
        let mut model = MomentumModel::new(0.0, LabelMode::Multiclass).unwrap();

        let outcome =
            run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "20240101_000000")
                .unwrap();
        assert!(outcome.signals_path.ends_with("signals_momentum_20240101_000000.csv"));
        assert!(outcome.backtest_path.exists());

        let signals = CsvSignalReader.read_table(&outcome.signals_path).unwrap();
        let params = AnalysisParams::default();
        for kind in [
            AnalysisKind::Distribution,
            AnalysisKind::Mae,
            AnalysisKind::RunLength,
            AnalysisKind::LeadLag,
        ] {
            run_analysis(kind, &signals, &params)
                .unwrap_or_else(|e| panic!("{kind} failed: {e}"));
        }
        assert!(matches!(
            run_analysis(AnalysisKind::FinancialMetrics, &signals, &params),
            Err(SigbenchError::MissingColumn { .. })
        ));

        let backtest = CsvSignalReader.read_table(&outcome.backtest_path).unwrap();
        let AnalysisReport::FinancialMetrics(metrics) =
            run_analysis(AnalysisKind::FinancialMetrics, &backtest, &params).unwrap()
        else {
            panic!("expected financial metrics");
        };
        assert_relative_eq!(
            metrics.final_cumulative_return,
            outcome.financial.final_cumulative_return,
            epsilon = 1e-12
        );
    }

    #[test]
    fn second_run_with_same_id_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let source =
            MockPriceSource::new().with_bars("X", bars_from_closes(&wave_closes(30)));
        let writer = CsvSignalWriter::new(dir.path().to_path_buf());

        let mut model = MajorityClassModel::default();
        run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "same").unwrap();
        let err = run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "same")
            .unwrap_err();
        assert!(matches!(err, SigbenchError::OutputExists { .. }));
    }

    #[test]
    fn rerunning_backtest_on_signals_file_matches_pipeline() {
        let dir = TempDir::new().unwrap();
        let source =
            MockPriceSource::new().with_bars("X", bars_from_closes(&wave_closes(50)));
        let writer = CsvSignalWriter::new(dir.path().to_path_buf());
        let mut model = MomentumModel::new(0.0, LabelMode::Multiclass).unwrap();
        let outcome =
            run_pipeline(&source, &mut model, &writer, &pipeline_config("X"), "r").unwrap();

        let signals = CsvSignalReader.read_table(&outcome.signals_path).unwrap();
        let result = run_on_table(&signals, PREDICTED_SIGNAL, &BacktestConfig::default()).unwrap();
        let table = result.to_table(&signals).unwrap();
        assert_eq!(
            table.column(CUM_STRATEGY_RETURN).unwrap().last().copied(),
            Some(outcome.financial.final_cumulative_return)
        );
    }
}

mod worked_examples {
    use super::*;

    #[test]
    fn labels_from_close_series() {
        let bars = vec![
            make_bar(0, 100.0, 100.0),
            make_bar(1, 100.0, 101.0),
            make_bar(2, 101.0, 99.0),
            make_bar(3, 99.0, 102.0),
            make_bar(4, 102.0, 105.0),
        ];
        let labeler = PriceDirectionLabeler::new(LabelParams {
            horizon: 1,
            threshold: 0.0,
            ..LabelParams::default()
        });
        let labels = labeler.generate(&PriceSeries::new(bars).unwrap()).unwrap();
        assert_eq!(labels, vec![Some(1), Some(-1), Some(1), Some(1), None]);
    }

    #[test]
    fn run_length_encoding() {
        let runs: Vec<(i8, usize)> = encode(&[1i8, 1, 1, -1, -1, 0])
            .iter()
            .map(|r| (r.value, r.length))
            .collect();
        assert_eq!(runs, vec![(1, 3), (-1, 2), (0, 1)]);
    }

    #[test]
    fn lead_lag_without_mispredicted_changes() {
        let outcome = analyze_lead_lag(&[0, 0, 1, 1], &[0, 1, 1, 1], 2).unwrap();
        assert!(matches!(outcome, LeadLagOutcome::NoEvents { .. }));
    }

    #[test]
    fn flat_predictions_keep_capital() {
        let result =
            run_backtest(&[0; 6], &[10.0, 12.0, 9.0, 15.0, 15.0, 3.0], &BacktestConfig::default())
                .unwrap();
        assert!(result.cumulative_returns.iter().all(|&c| c == 1.0));
    }

    #[test]
    fn split_sizes() {
        let x: Vec<usize> = (0..10).collect();
        let s = split(&x, &x, 0.25).unwrap();
        assert_eq!(s.x_train.len(), 7);
        assert_eq!(s.x_test, vec![7, 8, 9]);
    }
}
