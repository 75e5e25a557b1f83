//! CSV price data adapter.
//!
//! One file per symbol under a base directory, `{symbol}.csv` with `/` in the
//! symbol replaced by `_` (so `BTC/USDT` lives in `BTC_USDT.csv`). Columns are
//! matched by header name: `timestamp,open,high,low,close,volume`.

use crate::domain::error::SigbenchError;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::price_port::PriceSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRICE_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug, Deserialize)]
struct PriceRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.replace('/', "_")))
    }
}

impl PriceSource for CsvAdapter {
    fn load_prices(&self, symbol: &str) -> Result<PriceSeries, SigbenchError> {
        read_price_file(&self.csv_path(symbol))
    }
}

/// Reads and validates one OHLCV file. Rows must already be in ascending
/// timestamp order.
pub fn read_price_file(path: &Path) -> Result<PriceSeries, SigbenchError> {
    let content = fs::read_to_string(path).map_err(|e| SigbenchError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    if let Some(missing) = PRICE_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h.eq_ignore_ascii_case(col)))
    {
        return Err(SigbenchError::missing_column(missing));
    }
    let lowered: csv::StringRecord = headers.iter().map(|h| h.to_lowercase()).collect();
    rdr.set_headers(lowered);

    let mut bars = Vec::new();
    for (row, result) in rdr.deserialize::<PriceRecord>().enumerate() {
        let record = result.map_err(|e| SigbenchError::Data {
            reason: format!("{} row {}: {}", path.display(), row + 1, e),
        })?;
        bars.push(OhlcvBar {
            timestamp: parse_timestamp(&record.timestamp)?,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    PriceSeries::new(bars)
}

/// Accepts epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, SigbenchError> {
    let value = raw.trim();
    let invalid = || SigbenchError::Data {
        reason: format!("invalid timestamp '{value}'"),
    };

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = value.parse().map_err(|_| invalid())?;
        return DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(invalid);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)
}
