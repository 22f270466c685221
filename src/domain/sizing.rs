//! Percentage-risk position sizing.
//!
//! shares = floor(min(risk_pct * capital / |entry - stop|, max_pct * capital / entry))
//!
//! A degenerate stop (zero or non-finite per-share risk) and a position whose
//! cost exceeds current capital both size to zero.

/// Share count for a new position, `0` when the trade must be rejected.
pub fn size(capital: f64, entry_price: f64, stop_price: f64, risk_pct: f64, max_pct: f64) -> u64 {
    if !(capital.is_finite() && capital > 0.0 && entry_price.is_finite() && entry_price > 0.0) {
        return 0;
    }

    let per_share_risk = (entry_price - stop_price).abs();
    if !per_share_risk.is_finite() || per_share_risk <= 0.0 {
        return 0;
    }

    let risk_per_trade = risk_pct * capital;
    let max_position_value = max_pct * capital;
    let raw = (risk_per_trade / per_share_risk).min(max_position_value / entry_price);
    if !raw.is_finite() || raw < 1.0 {
        return 0;
    }

    let shares = raw.floor() as u64;
    if shares as f64 * entry_price > capital {
        return 0;
    }
    shares
}
