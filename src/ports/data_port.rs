//! Price history access port trait.

use crate::domain::error::TradesysError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily bars. Implementations are shared across loader threads.
pub trait DataPort: Sync {
    /// Bars for `symbol` in ascending date order, limited to the optional
    /// inclusive date window.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TradesysError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesysError>;

    /// First date, last date and bar count, or `None` when the symbol has no bars.
    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesysError>;
}
