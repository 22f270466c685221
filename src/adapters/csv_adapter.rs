//! CSV file data adapter.
//!
//! One file per symbol, `<SYMBOL>.csv`, with a header row and the columns
//! `date,open,high,low,close,volume`. Dates are `YYYY-MM-DD`. Symbols are
//! upper case; file names may use any case.

use crate::domain::error::TradesysError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<symbol>.csv`, falling back to a file whose stem matches ignoring case.
    fn csv_path(&self, symbol: &str) -> Option<PathBuf> {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return Some(exact);
        }
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some("csv")
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, TradesysError> {
        let path = self.csv_path(symbol).ok_or_else(|| TradesysError::NoData {
            symbol: symbol.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                TradesysError::Data {
                    reason: format!("{} row {}: invalid date {:?}: {}", path.display(), line + 1, row.date, e),
                }
            })?;
            bars.push(OhlcvBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                // some vendors write volume as a float
                volume: row.volume.round() as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TradesysError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| {
            start_date.is_none_or(|start| b.date >= start) && end_date.is_none_or(|end| b.date <= end)
        });
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesysError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradesysError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_uppercase());
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesysError> {
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
