//! Price data access port.

use crate::domain::error::SigbenchError;
use crate::domain::ohlcv::PriceSeries;

pub trait PriceSource {
    /// Full OHLCV history for `symbol`, oldest bar first.
    fn load_prices(&self, symbol: &str) -> Result<PriceSeries, SigbenchError>;
}
