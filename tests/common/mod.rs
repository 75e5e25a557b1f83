#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sigbench::domain::error::SigbenchError;
pub use sigbench::domain::ohlcv::{OhlcvBar, PriceSeries};
use sigbench::domain::signal::SignalTable;
use sigbench::ports::price_port::PriceSource;
use sigbench::ports::signal_port::{OutputKind, SignalWriter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn load_prices(&self, symbol: &str) -> Result<PriceSeries, SigbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigbenchError::Data {
                reason: reason.clone(),
            });
        }
        PriceSeries::new(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

/// Keeps every written table in memory, in write order.
#[derive(Default)]
pub struct MemoryWriter {
    pub written: RefCell<Vec<(OutputKind, String, SignalTable)>>,
}

impl MemoryWriter {
    pub fn table(&self, kind: OutputKind) -> Option<SignalTable> {
        self.written
            .borrow()
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|(_, _, t)| t.clone())
    }
}

impl SignalWriter for MemoryWriter {
    fn write(
        &self,
        kind: OutputKind,
        table: &SignalTable,
        model_name: &str,
        run_id: &str,
    ) -> Result<PathBuf, SigbenchError> {
        let name = format!("{kind}_{model_name}_{run_id}.csv");
        self.written
            .borrow_mut()
            .push((kind, name.clone(), table.clone()));
        Ok(PathBuf::from(name))
    }
}

pub fn hour(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(i as i64)
}

pub fn make_bar(i: usize, open: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: hour(i),
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 1_000.0,
    }
}

/// Bars opening at the previous close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            make_bar(i, open, close)
        })
        .collect()
}

/// Deterministic zig-zag with drift, long enough for any pipeline test.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 * 0.1 + if i % 3 == 0 { 2.0 } else { -1.0 })
        .collect()
}

pub fn price_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
