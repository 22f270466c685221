//! Historical volatility.
//!
//! Sample standard deviation (n - 1 denominator) of the last `n` daily log
//! returns, annualised with sqrt(252) and expressed in percent.

use crate::domain::ohlcv::OhlcvBar;

const TRADING_DAYS: f64 = 252.0;

pub fn historical_volatility(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period < 2 || bars.len() <= period {
        return out;
    }

    let log_returns: Vec<f64> = bars
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect();

    for i in period..bars.len() {
        // returns for bars i+1-period..=i live at indices i-period..i
        let window = &log_returns[i - period..i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        let hv = var.sqrt() * TRADING_DAYS.sqrt() * 100.0;
        if hv.is_finite() {
            out[i] = Some(hv);
        }
    }
    out
}
