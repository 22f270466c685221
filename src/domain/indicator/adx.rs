//! ADX (Average Directional Index), Wilder's formulation.
//!
//! For each bar after the first:
//! - +DM = up move when it exceeds the down move and is positive, else 0
//! - -DM = down move when it exceeds the up move and is positive, else 0
//! - TR, +DM and -DM are Wilder-summed: seed with the sum of the first n,
//!   then `s = s - s / n + x`
//! - DX = 100 * |+DI - -DI| / (+DI + -DI)
//!
//! ADX seeds with the mean of the first n DX values and is then smoothed as
//! `(prev * (n - 1) + dx) / n`. First defined value at index `2n - 1`.

use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < 2 * period {
        return out;
    }

    let n = period as f64;
    let mut tr_s = 0.0;
    let mut plus_s = 0.0;
    let mut minus_s = 0.0;
    let mut dx_seed = Vec::with_capacity(period);
    let mut adx = 0.0;

    for i in 1..bars.len() {
        let (tr, plus_dm, minus_dm) = directional_move(&bars[i - 1], &bars[i]);

        if i <= period {
            tr_s += tr;
            plus_s += plus_dm;
            minus_s += minus_dm;
            if i < period {
                continue;
            }
        } else {
            tr_s = tr_s - tr_s / n + tr;
            plus_s = plus_s - plus_s / n + plus_dm;
            minus_s = minus_s - minus_s / n + minus_dm;
        }

        let dx = directional_index(tr_s, plus_s, minus_s);
        if dx_seed.len() < period {
            dx_seed.push(dx);
            if dx_seed.len() == period {
                adx = dx_seed.iter().sum::<f64>() / n;
                out[i] = Some(adx);
            }
        } else {
            adx = (adx * (n - 1.0) + dx) / n;
            out[i] = Some(adx);
        }
    }
    out
}

fn directional_move(prev: &OhlcvBar, bar: &OhlcvBar) -> (f64, f64, f64) {
    let up = bar.high - prev.high;
    let down = prev.low - bar.low;
    let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
    let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };
    (bar.true_range(prev.close), plus_dm, minus_dm)
}

fn directional_index(tr_s: f64, plus_s: f64, minus_s: f64) -> f64 {
    if tr_s == 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_s / tr_s;
    let minus_di = 100.0 * minus_s / tr_s;
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}
