//! Trading systems as a small capability interface.
//!
//! Each system supplies a setup predicate over a prepared [`PriceSeries`], a
//! ranking metric, an entry rule, an exit rule and a signed PnL. The simulator
//! drives every system through [`TradingSystem`] and never looks at which one
//! it is running. Systems that do not override `compute_exit` get the shared
//! trailing-stop exit from [`hooks`].

pub mod hooks;
pub mod system1;
pub mod system2;
pub mod system3;
pub mod system4;
pub mod system5;
pub mod system6;
pub mod system7;

use crate::domain::candidate::Candidate;
use crate::domain::config::RiskConfig;
use crate::domain::error::TradesysError;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::config_port::ConfigPort;
use std::fmt;

pub use hooks::{EntryRule, ExitRules, Fill, PriceField, StopRule, Target, TimeExit, TrailingStop};

pub const SYSTEM_NAMES: [&str; 7] = [
    "system1", "system2", "system3", "system4", "system5", "system6", "system7",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Long: `(exit - entry) * shares`. Short: `(entry - exit) * shares`.
    pub fn pnl(self, entry_price: f64, exit_price: f64, shares: u64) -> f64 {
        let shares = shares as f64;
        match self {
            Side::Long => (exit_price - entry_price) * shares,
            Side::Short => (entry_price - exit_price) * shares,
        }
    }

    /// Protective stop `distance` away from `entry_price`, against the position.
    pub fn stop_price(self, entry_price: f64, distance: f64) -> f64 {
        match self {
            Side::Long => entry_price - distance,
            Side::Short => entry_price + distance,
        }
    }

    pub fn stop_hit(self, bar: &OhlcvBar, stop_price: f64) -> bool {
        match self {
            Side::Long => bar.low <= stop_price,
            Side::Short => bar.high >= stop_price,
        }
    }

    /// Price move from `entry_price` to `price` in the position's favour, as a fraction.
    pub fn gain(self, entry_price: f64, price: f64) -> f64 {
        match self {
            Side::Long => (price - entry_price) / entry_price,
            Side::Short => (entry_price - price) / entry_price,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranking {
    /// Column ranked on; `None` for single-instrument systems, where every
    /// candidate ranks equal.
    pub metric: Option<IndicatorType>,
    pub order: RankOrder,
}

/// Which symbols a system scans for setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniverseScope {
    Symbols,
    /// Only the market benchmark series.
    MarketOnly,
}

/// A filled entry: bar index, fill price, protective stop and the ATR used
/// to place it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPlan {
    pub entry_index: usize,
    pub entry_price: f64,
    pub stop_price: f64,
    pub atr: f64,
}

/// One round trip. Re-entry chains produce several legs per accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLeg {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
}

/// Why a candidate did not become a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, thiserror::Error)]
pub enum Rejection {
    #[error("open did not clear the required gap")]
    GapNotMet,
    #[error("day range never reached the limit price")]
    LimitNotReached,
    #[error("indicator value missing")]
    MissingIndicator,
    #[error("sized to zero shares")]
    ZeroShares,
    #[error("position cost exceeds capital")]
    InsufficientCapital,
    #[error("no bars after the entry bar")]
    NoForwardBars,
    #[error("entry date not in series")]
    MissingEntryDate,
}

pub trait TradingSystem: Send + Sync {
    fn name(&self) -> &'static str;
    fn side(&self) -> Side;
    /// Bars needed before a symbol is worth preparing.
    fn min_bars(&self) -> usize;
    /// Indicator columns appended during preparation.
    fn columns(&self) -> Vec<IndicatorType>;
    /// Setup predicate for bar `index`; false while any input is warming up.
    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool;
    fn ranking(&self) -> Ranking;
    fn stop_rule(&self) -> StopRule;
    fn risk(&self) -> &RiskConfig;

    fn entry_rule(&self) -> EntryRule {
        EntryRule::Open
    }

    /// SMA window of the benchmark trend filter, if the system uses one.
    fn market_filter(&self) -> Option<usize> {
        None
    }

    fn scope(&self) -> UniverseScope {
        UniverseScope::Symbols
    }

    fn trailing_stop(&self) -> TrailingStop {
        TrailingStop::default()
    }

    fn rank_value(&self, series: &PriceSeries, index: usize) -> Option<f64> {
        match self.ranking().metric {
            Some(kind) => series.value(kind, index),
            None => Some(0.0),
        }
    }

    fn compute_entry(
        &self,
        series: &PriceSeries,
        candidate: &Candidate,
        _capital: f64,
    ) -> Result<EntryPlan, Rejection> {
        hooks::rule_entry(self.side(), self.entry_rule(), self.stop_rule(), series, candidate)
    }

    fn compute_exit(
        &self,
        series: &PriceSeries,
        plan: &EntryPlan,
        shares: u64,
        _capital: f64,
    ) -> Vec<TradeLeg> {
        vec![hooks::trailing_exit(self.side(), series, plan, shares, self.trailing_stop())]
    }

    fn compute_pnl(&self, entry_price: f64, exit_price: f64, shares: u64) -> f64 {
        self.side().pnl(entry_price, exit_price, shares)
    }
}

/// Builds a system by name with its defaults overlaid by `[systemN]` keys.
pub fn create_system(
    name: &str,
    config: &dyn ConfigPort,
    base_risk: RiskConfig,
) -> Result<Box<dyn TradingSystem>, TradesysError> {
    let system: Box<dyn TradingSystem> = match name.trim().to_lowercase().as_str() {
        "system1" => Box::new(system1::System1::from_config(config, base_risk)),
        "system2" => Box::new(system2::System2::from_config(config, base_risk)),
        "system3" => Box::new(system3::System3::from_config(config, base_risk)),
        "system4" => Box::new(system4::System4::from_config(config, base_risk)),
        "system5" => Box::new(system5::System5::from_config(config, base_risk)),
        "system6" => Box::new(system6::System6::from_config(config, base_risk)),
        "system7" => Box::new(system7::System7::from_config(config, base_risk)),
        other => return Err(TradesysError::UnknownSystem(other.to_string())),
    };
    Ok(system)
}

/// `close[i] > close[i-1] > close[i-2]`
pub(crate) fn two_up_closes(series: &PriceSeries, index: usize) -> bool {
    if index < 2 {
        return false;
    }
    let b = &series.bars;
    b[index].close > b[index - 1].close && b[index - 1].close > b[index - 2].close
}

/// Reads a window length, keeping the default for missing or non-positive values.
pub(crate) fn window_param(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    match config.get_int(section, key, default as i64) {
        v if v > 0 => v as usize,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use chrono::NaiveDate;

    fn bar(close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn signed_pnl() {
        assert!((Side::Long.pnl(10.0, 12.0, 100) - 200.0).abs() < f64::EPSILON);
        assert!((Side::Short.pnl(10.0, 12.0, 100) + 200.0).abs() < f64::EPSILON);
        assert!((Side::Short.pnl(10.0, 7.5, 4) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_direction() {
        assert!((Side::Long.stop_price(50.0, 5.0) - 45.0).abs() < f64::EPSILON);
        assert!((Side::Short.stop_price(50.0, 5.0) - 55.0).abs() < f64::EPSILON);
        assert!(Side::Long.stop_hit(&bar(50.0), 49.5));
        assert!(!Side::Long.stop_hit(&bar(50.0), 48.0));
        assert!(Side::Short.stop_hit(&bar(50.0), 51.0));
        assert!(!Side::Short.stop_hit(&bar(50.0), 51.5));
    }

    #[test]
    fn gain_is_side_aware() {
        assert!((Side::Long.gain(100.0, 104.0) - 0.04).abs() < 1e-12);
        assert!((Side::Short.gain(100.0, 96.0) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn create_every_named_system() {
        let config = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        for name in SYSTEM_NAMES {
            let system = create_system(name, &config, RiskConfig::default()).unwrap();
            assert_eq!(system.name(), name);
        }
    }

    #[test]
    fn create_unknown_system() {
        let config = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let err = create_system("system8", &config, RiskConfig::default()).err().unwrap();
        assert!(matches!(err, TradesysError::UnknownSystem(ref n) if n == "system8"));
    }

    #[test]
    fn sides_match_rule_book() {
        let config = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let sides: Vec<Side> = SYSTEM_NAMES
            .iter()
            .map(|n| create_system(n, &config, RiskConfig::default()).unwrap().side())
            .collect();
        assert_eq!(
            sides,
            vec![
                Side::Long,
                Side::Short,
                Side::Long,
                Side::Long,
                Side::Long,
                Side::Short,
                Side::Short
            ]
        );
    }

    #[test]
    fn two_up_closes_needs_strict_rise() {
        let mut series = PriceSeries::new("X", vec![bar(1.0), bar(2.0), bar(3.0), bar(3.0)]);
        assert!(!two_up_closes(&series, 1));
        assert!(two_up_closes(&series, 2));
        assert!(!two_up_closes(&series, 3));
        series.bars[1].close = 0.5;
        assert!(!two_up_closes(&series, 2));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::indicator::{IndicatorSeries, IndicatorType};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::price_series::PriceSeries;
    use chrono::NaiveDate;

    pub fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    /// `len` identical bars at `close` with a one-dollar range.
    pub fn flat_series(len: usize, close: f64, volume: i64) -> PriceSeries {
        let bars = (0..len)
            .map(|i| OhlcvBar {
                date: day(i),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume,
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    /// Overwrites one column value, creating the column when absent.
    pub fn set_value(series: &mut PriceSeries, kind: IndicatorType, index: usize, value: f64) {
        let len = series.len();
        let column = series.columns.entry(kind).or_insert_with(|| IndicatorSeries {
            indicator_type: kind,
            values: vec![None; len],
        });
        column.values[index] = Some(value);
    }
}
