//! One backtest run: prepare, generate candidates, simulate.

use crate::domain::candidate;
use crate::domain::config::RunConfig;
use crate::domain::error::TradesysError;
use crate::domain::prepare::{prepare_market, prepare_universe};
use crate::domain::progress::{LogObserver, ProgressObserver};
use crate::domain::simulator::{SimulationResult, simulate};
use crate::domain::strategy::{TradingSystem, UniverseScope};
use crate::domain::universe::MarketData;
use log::info;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Runs `system` over `data`. Fails only when the system needs the benchmark
/// series and it was not loaded; every per-symbol problem is absorbed.
pub fn run_system(
    system: &dyn TradingSystem,
    data: &MarketData,
    run: &RunConfig,
    observer: &dyn ProgressObserver,
) -> Result<SimulationResult, TradesysError> {
    let missing_market = || TradesysError::MissingMarketSeries {
        symbol: data.market_symbol.clone(),
    };

    let market = match system.market_filter() {
        Some(window) => {
            let bars = data.market.as_deref().ok_or_else(missing_market)?;
            let series = prepare_market(&data.market_symbol, bars, window).map_err(|e| TradesysError::Data {
                reason: format!("{}: {}", data.market_symbol, e),
            })?;
            Some(series)
        }
        None => None,
    };

    let prepared = match system.scope() {
        UniverseScope::Symbols => prepare_universe(system, &data.universe, run.log_batch_size, observer),
        UniverseScope::MarketOnly => {
            let bars = data.market.as_ref().ok_or_else(missing_market)?;
            let raw = BTreeMap::from([(data.market_symbol.clone(), bars.clone())]);
            prepare_universe(system, &raw, run.log_batch_size, observer)
        }
    };

    let order: &[String] = match system.scope() {
        UniverseScope::Symbols => &data.symbols,
        UniverseScope::MarketOnly => &[],
    };
    let candidates = candidate::generate(
        system,
        &prepared.series,
        order,
        market.as_ref(),
        system.risk().top_n,
        run.log_batch_size,
        observer,
    );
    info!(
        "{}: {} symbols prepared, {} candidate dates",
        system.name(),
        prepared.series.len(),
        candidates.len()
    );

    Ok(simulate(
        system,
        &prepared.series,
        &candidates,
        run.initial_capital,
        run.progress_every,
        observer,
    ))
}

/// Runs independent systems in parallel; each keeps its own sequential date loop.
pub fn run_systems(
    systems: &[Box<dyn TradingSystem>],
    data: &MarketData,
    run: &RunConfig,
) -> Vec<(&'static str, Result<SimulationResult, TradesysError>)> {
    systems
        .par_iter()
        .map(|system| {
            let observer = LogObserver::new(system.name());
            (system.name(), run_system(system.as_ref(), data, run, &observer))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::config::RiskConfig;
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::progress::NoopObserver;
    use crate::domain::strategy::create_system;
    use crate::domain::strategy::test_support::day;

    fn run_config() -> RunConfig {
        let config = FileConfigAdapter::from_string("[data]\npath = prices\n").unwrap();
        RunConfig::from_port(&config).unwrap()
    }

    fn system(name: &str) -> Box<dyn TradingSystem> {
        let config = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        create_system(name, &config, RiskConfig::default()).unwrap()
    }

    /// Steady decline, so the benchmark keeps making new closing lows.
    fn falling(len: usize) -> Vec<OhlcvBar> {
        (0..len)
            .map(|i| {
                let close = 500.0 - i as f64;
                OhlcvBar {
                    date: day(i),
                    open: close + 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 50_000_000,
                }
            })
            .collect()
    }

    #[test]
    fn filtered_system_needs_market_series() {
        let data = MarketData {
            market_symbol: "SPY".into(),
            ..MarketData::default()
        };
        let err = run_system(system("system1").as_ref(), &data, &run_config(), &NoopObserver).unwrap_err();
        assert!(matches!(err, TradesysError::MissingMarketSeries { ref symbol } if symbol == "SPY"));
    }

    #[test]
    fn unfiltered_system_runs_without_market() {
        let data = MarketData {
            symbols: vec!["AAA".into()],
            universe: BTreeMap::from([("AAA".to_string(), falling(30))]),
            market_symbol: "SPY".into(),
            market: None,
        };
        let result = run_system(system("system2").as_ref(), &data, &run_config(), &NoopObserver).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_capital, result.initial_capital);
    }

    #[test]
    fn market_only_system_trades_the_benchmark() {
        let data = MarketData {
            symbols: vec!["AAA".into()],
            universe: BTreeMap::from([("AAA".to_string(), falling(120))]),
            market_symbol: "SPY".into(),
            market: Some(falling(120)),
        };
        let result = run_system(system("system7").as_ref(), &data, &run_config(), &NoopObserver).unwrap();
        // one position at a time, held to the end of data
        assert_eq!(result.trades.len(), 1);
        assert!(result.trades.iter().all(|t| t.symbol == "SPY"));
        assert!(result.trades[0].pnl > 0.0);
    }

    #[test]
    fn run_systems_reports_each_system() {
        let data = MarketData {
            symbols: vec!["AAA".into()],
            universe: BTreeMap::from([("AAA".to_string(), falling(30))]),
            market_symbol: "SPY".into(),
            market: None,
        };
        let systems = vec![system("system2"), system("system4")];
        let results = run_systems(&systems, &data, &run_config());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "system2");
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(TradesysError::MissingMarketSeries { .. })));
    }
}
