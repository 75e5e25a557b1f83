//! CSV persistence for signal, backtest and metrics tables.
//!
//! Files are header-driven: every header becomes a column. Empty cells read
//! back as `NaN`; columns holding text (such as a formatted timestamp) are
//! skipped on read.

use crate::domain::error::SigbenchError;
use crate::domain::signal::SignalTable;
use crate::ports::signal_port::{OutputKind, SignalSource, SignalWriter};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvSignalReader;

impl SignalSource for CsvSignalReader {
    fn read_table(&self, path: &Path) -> Result<SignalTable, SigbenchError> {
        read_table(path)
    }
}

pub fn read_table(path: &Path) -> Result<SignalTable, SigbenchError> {
    let content = fs::read_to_string(path).map_err(|e| SigbenchError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (col, value) in cells.iter_mut().zip(record.iter()) {
            col.push(parse_cell(value));
        }
    }

    let mut table = SignalTable::new();
    for (name, values) in headers.iter().zip(cells) {
        if values.iter().any(Option::is_none) {
            debug!(column = %name, file = %path.display(), "skipping non-numeric column");
            continue;
        }
        table.insert(name, values.into_iter().flatten().collect())?;
    }
    Ok(table)
}

/// `Some(NaN)` for an empty cell, `None` for text.
fn parse_cell(value: &str) -> Option<f64> {
    if value.is_empty() {
        return Some(f64::NAN);
    }
    value.parse::<f64>().ok()
}

pub struct CsvSignalWriter {
    output_dir: PathBuf,
}

impl CsvSignalWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_path(&self, kind: OutputKind, model_name: &str, run_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{kind}_{model_name}_{run_id}.csv"))
    }
}

impl SignalWriter for CsvSignalWriter {
    fn write(
        &self,
        kind: OutputKind,
        table: &SignalTable,
        model_name: &str,
        run_id: &str,
    ) -> Result<PathBuf, SigbenchError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path(kind, model_name, run_id);
        write_table(&path, table)?;
        Ok(path)
    }
}

/// Writes `table` to a new file at `path`; an existing file is an error.
pub fn write_table(path: &Path, table: &SignalTable) -> Result<(), SigbenchError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => SigbenchError::OutputExists {
                path: path.display().to_string(),
            },
            _ => SigbenchError::Io(e),
        })?;

    let mut wtr = csv::Writer::from_writer(file);
    let names: Vec<&str> = table.column_names().collect();
    wtr.write_record(&names)?;
    for i in 0..table.len() {
        wtr.write_record(table.row(i).map(|(_, v)| format_cell(v)))?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{PREDICTED_SIGNAL, TRUE_SIGNAL};
    use tempfile::TempDir;

    fn sample() -> SignalTable {
        SignalTable::new()
            .with_column("close", vec![100.0, 101.5, 99.0])
            .unwrap()
            .with_column(TRUE_SIGNAL, vec![1.0, -1.0, 0.0])
            .unwrap()
            .with_column("strategy_return", vec![f64::NAN, 0.015, -0.0246])
            .unwrap()
    }

    #[test]
    fn writer_names_file_by_kind_model_and_run() {
        let dir = TempDir::new().unwrap();
        let writer = CsvSignalWriter::new(dir.path().join("out"));
        let path = writer
            .write(OutputKind::Backtest, &sample(), "majority", "run1")
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "backtest_majority_run1.csv");
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("close,true_signal,strategy_return\n"));
        assert!(text.contains("100,1,\n"));
    }

    #[test]
    fn writer_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let writer = CsvSignalWriter::new(dir.path().to_path_buf());
        writer
            .write(OutputKind::Signals, &sample(), "m", "r")
            .unwrap();
        let err = writer
            .write(OutputKind::Signals, &sample(), "m", "r")
            .unwrap_err();
        assert!(matches!(err, SigbenchError::OutputExists { .. }));
    }

    #[test]
    fn written_table_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        write_table(&path, &sample()).unwrap();

        let table = CsvSignalReader.read_table(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column(TRUE_SIGNAL).unwrap(), &[1.0, -1.0, 0.0]);
        let returns = table.column("strategy_return").unwrap();
        assert!(returns[0].is_nan());
        assert_eq!(returns[1], 0.015);
    }

    #[test]
    fn text_columns_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(
            &path,
            "timestamp,true_signal,predicted_signal\n2024-01-01,1,0\n2024-01-02,0,0\n",
        )
        .unwrap();
        let table = read_table(&path).unwrap();
        assert!(!table.has_column("timestamp"));
        assert_eq!(table.column(PREDICTED_SIGNAL).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn header_only_file_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "true_signal,predicted_signal\n").unwrap();
        let table = read_table(&path).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn missing_file_is_data_error() {
        let err = read_table(Path::new("/nonexistent/signals.csv")).unwrap_err();
        assert!(matches!(err, SigbenchError::Data { .. }));
    }
}
