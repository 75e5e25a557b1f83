//! Financial performance metrics over per-bar strategy returns.

use crate::domain::error::SigbenchError;
use crate::domain::signal::{SignalTable, CUM_STRATEGY_RETURN, MARKET_RETURN, STRATEGY_RETURN};

/// Added to the standard deviation so a constant return series does not
/// divide by zero.
pub const SHARPE_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialMetrics {
    pub mean_strategy_return: f64,
    pub mean_market_return: f64,
    pub final_cumulative_return: f64,
    pub total_return: f64,
    pub market_cumulative_return: f64,
    /// mean / (std + 1e-8); no annualization, no risk-free rate.
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    /// Bars with a defined strategy return.
    pub periods: usize,
}

impl FinancialMetrics {
    pub fn compute(
        strategy_returns: &[Option<f64>],
        market_returns: &[Option<f64>],
        cumulative: &[f64],
    ) -> Self {
        let strategy: Vec<f64> = strategy_returns.iter().flatten().copied().collect();
        let market: Vec<f64> = market_returns.iter().flatten().copied().collect();

        let final_cumulative_return = cumulative.last().copied().unwrap_or(1.0);
        let market_cumulative_return = market.iter().fold(1.0, |acc, r| acc * (1.0 + r));

        FinancialMetrics {
            mean_strategy_return: mean(&strategy),
            mean_market_return: mean(&market),
            final_cumulative_return,
            total_return: final_cumulative_return - 1.0,
            market_cumulative_return,
            sharpe_ratio: simple_sharpe(&strategy),
            max_drawdown: compute_drawdown(cumulative),
            periods: strategy.len(),
        }
    }

    /// Metrics of a persisted backtest table. `NaN` cells count as undefined.
    /// `market_return` is optional: older reports only carry `close`.
    pub fn from_table(table: &SignalTable) -> Result<Self, SigbenchError> {
        let strategy = defined(table.column(STRATEGY_RETURN)?);
        let cumulative: Vec<f64> = table
            .column(CUM_STRATEGY_RETURN)?
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if cumulative.is_empty() {
            return Err(SigbenchError::empty_series(
                "backtest table has no cumulative returns",
            ));
        }

        let market = if table.has_column(MARKET_RETURN) {
            defined(table.column(MARKET_RETURN)?)
        } else {
            let closes = table.column(crate::domain::signal::CLOSE)?;
            let mut returns = vec![None];
            returns.extend(closes.windows(2).map(|w| {
                if w[0] != 0.0 {
                    Some((w[1] - w[0]) / w[0])
                } else {
                    None
                }
            }));
            returns
        };

        Ok(Self::compute(&strategy, &market, &cumulative))
    }
}

fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&v| if v.is_finite() { Some(v) } else { None })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn simple_sharpe(returns: &[f64]) -> f64 {
    mean(returns) / (sample_std(returns) + SHARPE_EPSILON)
}

/// Largest peak-to-trough decline of a growth curve, as a fraction of the peak.
fn compute_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in curve {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
