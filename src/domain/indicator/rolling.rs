//! Rolling-window helpers: mean, lowest close and highest close.
//!
//! The window at index `i` covers `[i + 1 - n, i]`, so the current bar is
//! always included. Values before index `n - 1` are `None`.

use crate::domain::ohlcv::OhlcvBar;

/// Simple rolling mean over `window` values, maintained as a running sum.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

pub fn lowest_close(bars: &[OhlcvBar], window: usize) -> Vec<Option<f64>> {
    rolling_extreme(bars, window, f64::min)
}

pub fn highest_close(bars: &[OhlcvBar], window: usize) -> Vec<Option<f64>> {
    rolling_extreme(bars, window, f64::max)
}

fn rolling_extreme(bars: &[OhlcvBar], window: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; bars.len()];
    }
    (0..bars.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            bars[i + 1 - window..=i]
                .iter()
                .map(|b| b.close)
                .reduce(pick)
        })
        .collect()
}
