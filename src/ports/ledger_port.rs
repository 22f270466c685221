//! Trade ledger output port trait.

use crate::domain::error::TradesysError;
use crate::domain::simulator::SimulationResult;
use std::path::PathBuf;

pub trait LedgerPort {
    /// Writes one row per trade and returns where it went.
    fn write_ledger(&self, result: &SimulationResult) -> Result<PathBuf, TradesysError>;

    /// Writes the per-date capital log.
    fn write_capital_log(&self, result: &SimulationResult) -> Result<PathBuf, TradesysError>;
}
