//! Technical indicator implementations.
//!
//! Every indicator produces an [`IndicatorSeries`]: one `Option<f64>` per input
//! bar, `None` until the rolling window has warmed up.
//! [`IndicatorType`] carries identity and parameters and serves as the column
//! key inside a [`PriceSeries`](crate::domain::price_series::PriceSeries).

pub mod adx;
pub mod atr;
pub mod roc;
pub mod rolling;
pub mod rsi;
pub mod volatility;

use crate::domain::ohlcv::OhlcvBar;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    /// Simple moving average of close.
    Sma(usize),
    /// Wilder-smoothed average true range.
    Atr(usize),
    /// Plain rolling mean of true range.
    AtrMean(usize),
    Rsi(usize),
    Adx(usize),
    /// Rate of change in percent.
    Roc(usize),
    /// Fractional close-to-close return over n bars.
    Return(usize),
    AvgVolume(usize),
    DollarVolume(usize),
    /// Annualised historical volatility of log returns, in percent.
    Hv(usize),
    LowestClose(usize),
    HighestClose(usize),
}

impl IndicatorType {
    /// Number of bars needed before the first defined value.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Atr(n)
            | IndicatorType::AtrMean(n)
            | IndicatorType::AvgVolume(n)
            | IndicatorType::DollarVolume(n)
            | IndicatorType::LowestClose(n)
            | IndicatorType::HighestClose(n) => n,
            IndicatorType::Rsi(n)
            | IndicatorType::Roc(n)
            | IndicatorType::Return(n)
            | IndicatorType::Hv(n) => n + 1,
            IndicatorType::Adx(n) => 2 * n,
        }
    }

    pub fn compute(&self, bars: &[OhlcvBar]) -> IndicatorSeries {
        let values = match *self {
            IndicatorType::Sma(n) => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                rolling::rolling_mean(&closes, n)
            }
            IndicatorType::Atr(n) => atr::wilder_atr(bars, n),
            IndicatorType::AtrMean(n) => atr::mean_atr(bars, n),
            IndicatorType::Rsi(n) => rsi::calculate_rsi(bars, n),
            IndicatorType::Adx(n) => adx::calculate_adx(bars, n),
            IndicatorType::Roc(n) => roc::calculate_roc(bars, n),
            IndicatorType::Return(n) => roc::calculate_return(bars, n),
            IndicatorType::AvgVolume(n) => {
                let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
                rolling::rolling_mean(&volumes, n)
            }
            IndicatorType::DollarVolume(n) => {
                let dollars: Vec<f64> = bars.iter().map(OhlcvBar::dollar_volume).collect();
                rolling::rolling_mean(&dollars, n)
            }
            IndicatorType::Hv(n) => volatility::historical_volatility(bars, n),
            IndicatorType::LowestClose(n) => rolling::lowest_close(bars, n),
            IndicatorType::HighestClose(n) => rolling::highest_close(bars, n),
        };
        IndicatorSeries {
            indicator_type: *self,
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(n) => write!(f, "SMA{}", n),
            IndicatorType::Atr(n) => write!(f, "ATR{}", n),
            IndicatorType::AtrMean(n) => write!(f, "ATRMEAN{}", n),
            IndicatorType::Rsi(n) => write!(f, "RSI{}", n),
            IndicatorType::Adx(n) => write!(f, "ADX{}", n),
            IndicatorType::Roc(n) => write!(f, "ROC{}", n),
            IndicatorType::Return(n) => write!(f, "RETURN{}D", n),
            IndicatorType::AvgVolume(n) => write!(f, "AVGVOLUME{}", n),
            IndicatorType::DollarVolume(n) => write!(f, "DOLLARVOLUME{}", n),
            IndicatorType::Hv(n) => write!(f, "HV{}", n),
            IndicatorType::LowestClose(n) => write!(f, "MIN{}", n),
            IndicatorType::HighestClose(n) => write!(f, "MAX{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(count: usize) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.0 + i as f64,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn display_names() {
        assert_eq!(IndicatorType::Sma(25).to_string(), "SMA25");
        assert_eq!(IndicatorType::Return(3).to_string(), "RETURN3D");
        assert_eq!(IndicatorType::Adx(7).to_string(), "ADX7");
    }

    #[test]
    fn first_defined_value_matches_warmup() {
        let input = bars(60);
        let kinds = [
            IndicatorType::Sma(10),
            IndicatorType::Atr(10),
            IndicatorType::AtrMean(20),
            IndicatorType::Rsi(3),
            IndicatorType::Adx(7),
            IndicatorType::Roc(20),
            IndicatorType::Return(6),
            IndicatorType::AvgVolume(50),
            IndicatorType::DollarVolume(20),
            IndicatorType::Hv(20),
            IndicatorType::LowestClose(50),
            IndicatorType::HighestClose(5),
        ];
        for kind in kinds {
            let series = kind.compute(&input);
            assert_eq!(series.values.len(), input.len(), "{kind}");
            let first = series.values.iter().position(Option::is_some);
            assert_eq!(first, Some(kind.warmup() - 1), "{kind}");
        }
    }

    #[test]
    fn get_out_of_range_is_none() {
        let series = IndicatorType::Sma(2).compute(&bars(3));
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(100.5));
        assert_eq!(series.get(99), None);
    }
}
