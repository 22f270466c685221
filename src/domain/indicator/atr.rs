//! Average true range, in two flavours.
//!
//! True range at the first bar is `high - low`; afterwards it uses the prior
//! close. [`wilder_atr`] seeds with the mean of the first `n` ranges and then
//! applies `atr = (prev * (n - 1) + tr) / n`. [`mean_atr`] is the plain
//! rolling mean of true range.

use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn wilder_atr(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    let tr = true_ranges(bars);
    let mut atr = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(atr);
    for i in period..bars.len() {
        atr = (atr * (period - 1) as f64 + tr[i]) / period as f64;
        out[i] = Some(atr);
    }
    out
}

pub fn mean_atr(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_ranges(bars), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn sample() -> Vec<OhlcvBar> {
        vec![
            make_bar(1, 12.0, 10.0, 11.0), // tr 2
            make_bar(2, 13.0, 11.0, 12.0), // tr 2
            make_bar(3, 16.0, 12.0, 15.0), // tr 4
            make_bar(4, 15.0, 9.0, 10.0),  // tr 6
        ]
    }

    #[test]
    fn true_range_uses_prior_close() {
        let tr = true_ranges(&sample());
        assert_eq!(tr, vec![2.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn wilder_seed_then_smooth() {
        let atr = wilder_atr(&sample(), 2);
        assert_eq!(atr[0], None);
        assert!((atr[1].unwrap() - 2.0).abs() < f64::EPSILON);
        // (2 * 1 + 4) / 2 = 3, then (3 + 6) / 2 = 4.5
        assert!((atr[2].unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((atr[3].unwrap() - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_is_plain_rolling_average() {
        let atr = mean_atr(&sample(), 2);
        assert_eq!(atr[0], None);
        assert!((atr[2].unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((atr[3].unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn insufficient_bars() {
        assert!(wilder_atr(&sample(), 10).iter().all(Option::is_none));
        assert!(wilder_atr(&sample(), 0).iter().all(Option::is_none));
    }
}
