//! Run and risk configuration read through a [`ConfigPort`].
//!
//! Values not present in the INI file fall back to the defaults below.
//! Range checks live in [`config_validation`](crate::domain::config_validation).

use crate::domain::error::TradesysError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_RISK_PCT: f64 = 0.02;
pub const DEFAULT_MAX_POSITION_PCT: f64 = 0.10;
pub const DEFAULT_MAX_POSITIONS: usize = 10;
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_PROGRESS_EVERY: usize = 20;
pub const DEFAULT_LOG_BATCH: usize = 50;
pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_MARKET_SYMBOL: &str = "SPY";

/// Risk budget and slot limits for one simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    pub risk_pct: f64,
    pub max_position_pct: f64,
    pub max_positions: usize,
    pub top_n: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_pct: DEFAULT_RISK_PCT,
            max_position_pct: DEFAULT_MAX_POSITION_PCT,
            max_positions: DEFAULT_MAX_POSITIONS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RiskConfig {
    /// Applies any overrides found in `section` on top of `self`.
    pub fn with_overrides(self, config: &dyn ConfigPort, section: &str) -> Self {
        Self {
            risk_pct: config.get_double(section, "risk_pct", self.risk_pct),
            max_position_pct: config.get_double(section, "max_position_pct", self.max_position_pct),
            max_positions: get_usize(config, section, "max_concurrent_positions", self.max_positions),
            top_n: get_usize(config, section, "top_n_rank", self.top_n),
        }
    }
}

/// Everything a backtest run needs besides the systems themselves.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub symbols: Option<String>,
    pub market_symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub threads: usize,
    pub initial_capital: f64,
    pub risk: RiskConfig,
    pub progress_every: usize,
    pub log_batch_size: usize,
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TradesysError> {
        let data_path = config
            .get_string("data", "path")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| TradesysError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })?;

        Ok(Self {
            data_path: PathBuf::from(data_path.trim()),
            symbols: config
                .get_string("data", "symbols")
                .filter(|s| !s.trim().is_empty()),
            market_symbol: config
                .get_string("data", "market_symbol")
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_MARKET_SYMBOL.to_string()),
            start_date: parse_optional_date(config, "data", "start_date")?,
            end_date: parse_optional_date(config, "data", "end_date")?,
            threads: get_usize(config, "data", "threads", DEFAULT_THREADS),
            initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
            risk: RiskConfig::default().with_overrides(config, "backtest"),
            progress_every: get_usize(config, "backtest", "progress_every", DEFAULT_PROGRESS_EVERY),
            log_batch_size: get_usize(config, "backtest", "log_batch_size", DEFAULT_LOG_BATCH),
            output_dir: PathBuf::from(
                config
                    .get_string("output", "dir")
                    .unwrap_or_else(|| "results".to_string()),
            ),
        })
    }
}

/// Negative integers read as the default; validation reports them separately.
pub(crate) fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).unwrap_or(default)
}

pub(crate) fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, TradesysError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                TradesysError::invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))
            }),
    }
}
