//! Capital, active slots and the ledger of one simulation run.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::position::{ActivePosition, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalPoint {
    pub date: NaiveDate,
    pub capital: f64,
    /// PnL credited on this date.
    pub realized: f64,
    pub active_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub capital: f64,
    pub initial_capital: f64,
    pub active: BTreeMap<String, ActivePosition>,
    pub trades: Vec<Trade>,
    pub capital_log: Vec<CapitalPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            capital: initial_capital,
            initial_capital,
            active: BTreeMap::new(),
            trades: Vec::new(),
            capital_log: Vec::new(),
        }
    }

    pub fn is_active(&self, symbol: &str) -> bool {
        self.active.contains_key(symbol)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn available_slots(&self, max_positions: usize) -> usize {
        max_positions.saturating_sub(self.active.len())
    }

    /// Closes every position exiting on `date` and credits their PnL in one
    /// step. Returns the amount credited.
    pub fn apply_exits(&mut self, date: NaiveDate) -> f64 {
        let mut realized = 0.0;
        self.active.retain(|_, position| {
            if position.exit_date == date {
                realized += position.realized_pnl;
                false
            } else {
                true
            }
        });
        self.capital += realized;
        realized
    }

    pub fn open(&mut self, position: ActivePosition) {
        self.active.insert(position.symbol.clone(), position);
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn log_capital(&mut self, date: NaiveDate, realized: f64) {
        self.capital_log.push(CapitalPoint {
            date,
            capital: self.capital,
            realized,
            active_count: self.active.len(),
        });
    }
}
