//! CSV trade ledger writer.
//!
//! Writes `<system>_trades.csv` and `<system>_capital.csv` into one output
//! directory, creating it if needed.

use crate::domain::error::TradesysError;
use crate::domain::simulator::SimulationResult;
use crate::ports::ledger_port::LedgerPort;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvLedgerAdapter {
    output_dir: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write_rows<T: Serialize>(&self, file_name: String, rows: &[T]) -> Result<PathBuf, TradesysError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn write_ledger(&self, result: &SimulationResult) -> Result<PathBuf, TradesysError> {
        if result.trades.is_empty() {
            // header only, so an empty ledger is still a valid file
            fs::create_dir_all(&self.output_dir)?;
            let path = self.output_dir.join(format!("{}_trades.csv", result.system));
            fs::write(
                &path,
                "symbol,entry_date,exit_date,entry_price,exit_price,shares,pnl,return_pct\n",
            )?;
            return Ok(path);
        }
        self.write_rows(format!("{}_trades.csv", result.system), &result.trades)
    }

    fn write_capital_log(&self, result: &SimulationResult) -> Result<PathBuf, TradesysError> {
        self.write_rows(format!("{}_capital.csv", result.system), &result.capital_log)
    }
}
