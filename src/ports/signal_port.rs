//! Persistence ports for signal, backtest and metrics tables.

use crate::domain::error::SigbenchError;
use crate::domain::signal::SignalTable;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a persisted table holds; also the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Signals,
    Backtest,
    Metrics,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Signals => f.write_str("signals"),
            OutputKind::Backtest => f.write_str("backtest"),
            OutputKind::Metrics => f.write_str("metrics"),
        }
    }
}

/// Writes one file per (kind, model, run). Existing files are never
/// appended to or replaced.
pub trait SignalWriter {
    fn write(
        &self,
        kind: OutputKind,
        table: &SignalTable,
        model_name: &str,
        run_id: &str,
    ) -> Result<PathBuf, SigbenchError>;
}

pub trait SignalSource {
    fn read_table(&self, path: &Path) -> Result<SignalTable, SigbenchError>;
}
