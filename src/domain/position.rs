//! Slot occupancy and ledger rows.

use chrono::NaiveDate;
use serde::Serialize;

/// A position occupying a slot until `exit_date`, when `realized_pnl` is
/// credited to capital. Re-entry chains are one position with summed PnL.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePosition {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub realized_pnl: f64,
}

/// One ledger row. `return_pct` is relative to capital at entry time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub pnl: f64,
    pub return_pct: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
