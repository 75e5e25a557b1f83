//! Return-based backtest of a predicted signal series.
//!
//! Per bar i >= 1:
//!   market[i]     = (P[i] - P[i-1]) / P[i-1]
//!   position[i]   = signal[i-1]
//!   strategy[i]   = position[i] * market[i] - cost * |position[i] - position[i-1]|
//!   cumulative[i] = cumulative[i-1] * (1 + strategy[i]),  cumulative[0] = 1
//!
//! The position held over bar i is the signal decided at bar i-1, so no bar
//! ever trades on its own close.

use crate::domain::error::SigbenchError;
use crate::domain::metrics::FinancialMetrics;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::{
    self, Signal, SignalTable, CUM_STRATEGY_RETURN, MARKET_RETURN, STRATEGY_RETURN,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    /// Charge per unit of position change, as a fraction of the bar return.
    pub cost: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self { cost: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub positions: Vec<Option<Signal>>,
    pub market_returns: Vec<Option<f64>>,
    pub strategy_returns: Vec<Option<f64>>,
    pub cumulative_returns: Vec<f64>,
    pub metrics: FinancialMetrics,
}

pub fn run_backtest(
    predicted: &[Signal],
    prices: &[f64],
    config: &BacktestConfig,
) -> Result<BacktestResult, SigbenchError> {
    if prices.len() < 2 {
        return Err(SigbenchError::empty_series(format!(
            "backtest needs at least 2 bars, got {}",
            prices.len()
        )));
    }
    if predicted.len() != prices.len() {
        return Err(SigbenchError::invalid_parameter(
            "predicted_signal",
            format!(
                "{} signals for {} price bars",
                predicted.len(),
                prices.len()
            ),
        ));
    }
    if !config.cost.is_finite() || config.cost < 0.0 {
        return Err(SigbenchError::invalid_parameter(
            "cost",
            format!("must be a non-negative number, got {}", config.cost),
        ));
    }
    if let Some(i) = prices.iter().position(|p| !p.is_finite()) {
        return Err(SigbenchError::Computation {
            reason: format!("price at bar {i} is not finite"),
        });
    }
    if prices[0] == 0.0 {
        return Err(SigbenchError::Computation {
            reason: "price at bar 0 is zero; first return is undefined".into(),
        });
    }

    let n = prices.len();
    let mut positions = Vec::with_capacity(n);
    let mut market_returns = Vec::with_capacity(n);
    let mut strategy_returns = Vec::with_capacity(n);
    let mut cumulative_returns = Vec::with_capacity(n);

    positions.push(None);
    market_returns.push(None);
    strategy_returns.push(None);
    cumulative_returns.push(1.0);

    let mut cumulative = 1.0_f64;
    for i in 1..n {
        let position = predicted[i - 1];
        positions.push(Some(position));

        let prev = prices[i - 1];
        if prev == 0.0 {
            market_returns.push(None);
            strategy_returns.push(None);
            cumulative_returns.push(cumulative);
            continue;
        }

        let market = (prices[i] - prev) / prev;
        let previous_position = if i >= 2 { predicted[i - 2] } else { 0 };
        let turnover = f64::from((i16::from(position) - i16::from(previous_position)).abs());
        let strategy = f64::from(position) * market - config.cost * turnover;

        cumulative *= 1.0 + strategy;
        market_returns.push(Some(market));
        strategy_returns.push(Some(strategy));
        cumulative_returns.push(cumulative);
    }

    let metrics = FinancialMetrics::compute(&strategy_returns, &market_returns, &cumulative_returns);

    Ok(BacktestResult {
        positions,
        market_returns,
        strategy_returns,
        cumulative_returns,
        metrics,
    })
}

/// Backtest against the closing prices of `prices`.
pub fn run_on_series(
    predicted: &[Signal],
    prices: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, SigbenchError> {
    run_backtest(predicted, &prices.closes(), config)
}

impl BacktestResult {
    /// Appends the per-bar return columns to a copy of `base`.
    pub fn to_table(&self, base: &SignalTable) -> Result<SignalTable, SigbenchError> {
        let mut table = base.clone();
        table.insert(MARKET_RETURN, undefined_as_nan(&self.market_returns))?;
        table.insert(STRATEGY_RETURN, undefined_as_nan(&self.strategy_returns))?;
        table.insert(CUM_STRATEGY_RETURN, self.cumulative_returns.clone())?;
        Ok(table)
    }
}

/// Runs the backtest over a persisted signal table holding `close` and the
/// named signal column.
pub fn run_on_table(
    table: &SignalTable,
    signal_col: &str,
    config: &BacktestConfig,
) -> Result<BacktestResult, SigbenchError> {
    let prices = table.column(signal::CLOSE)?;
    let predicted = table.signal_column(signal_col)?;
    if prices.is_empty() {
        return Err(SigbenchError::empty_series("signal table has no rows"));
    }
    run_backtest(&predicted, prices, config)
}

fn undefined_as_nan(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}
