//! Close-to-close change over `n` bars.
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100, in percent.
//! Return(n)[i] is the same ratio as a fraction.
//! The first n bars are undefined, as is any bar whose base close is zero.

use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_roc(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    calculate_return(bars, period)
        .into_iter()
        .map(|v| v.map(|r| r * 100.0))
        .collect()
}

pub fn calculate_return(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let base = bars[i - period].close;
            if base == 0.0 {
                None
            } else {
                Some(bars[i].close / base - 1.0)
            }
        })
        .collect()
}
