//! Per-symbol indicator preparation.
//!
//! Symbols are prepared in parallel with no shared state besides a progress
//! counter. A symbol that cannot be prepared is skipped and counted; the batch
//! always completes.

use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PriceSeries;
use crate::domain::progress::{ProgressObserver, at_cadence};
use crate::domain::strategy::TradingSystem;
use log::warn;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("only {bars} bars, minimum {required} required")]
    InsufficientBars { bars: usize, required: usize },

    #[error("invalid price on bar {index}")]
    InvalidPrice { index: usize },

    #[error("dates not strictly increasing at bar {index}")]
    UnorderedDates { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: PrepareError,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedUniverse {
    pub series: BTreeMap<String, PriceSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

fn check_bars(bars: &[OhlcvBar], required: usize) -> Result<(), PrepareError> {
    if bars.len() < required {
        return Err(PrepareError::InsufficientBars {
            bars: bars.len(),
            required,
        });
    }
    if let Some(index) = bars.iter().position(|b| !b.is_sane()) {
        return Err(PrepareError::InvalidPrice { index });
    }
    if let Some(index) = bars.windows(2).position(|w| w[0].date >= w[1].date) {
        return Err(PrepareError::UnorderedDates { index: index + 1 });
    }
    Ok(())
}

/// Appends the system's columns and evaluates its setup predicate on every bar.
pub fn prepare_series(
    system: &dyn TradingSystem,
    symbol: &str,
    bars: &[OhlcvBar],
) -> Result<PriceSeries, PrepareError> {
    check_bars(bars, system.min_bars().max(1))?;

    let mut series = PriceSeries::new(symbol, bars.to_vec());
    series.add_columns(&system.columns());
    series.setup = (0..series.len())
        .map(|i| system.is_setup(&series, i))
        .collect();
    Ok(series)
}

/// Benchmark series with its trend-filter SMA.
pub fn prepare_market(symbol: &str, bars: &[OhlcvBar], sma_window: usize) -> Result<PriceSeries, PrepareError> {
    check_bars(bars, 1)?;
    let mut series = PriceSeries::new(symbol, bars.to_vec());
    series.add_columns(&[IndicatorType::Sma(sma_window)]);
    Ok(series)
}

pub fn prepare_universe(
    system: &dyn TradingSystem,
    raw: &BTreeMap<String, Vec<OhlcvBar>>,
    log_batch: usize,
    observer: &dyn ProgressObserver,
) -> PreparedUniverse {
    let total = raw.len();
    let done = AtomicUsize::new(0);

    let results: Vec<(String, Result<PriceSeries, PrepareError>)> = raw
        .par_iter()
        .map(|(symbol, bars)| {
            let result = prepare_series(system, symbol, bars);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if at_cadence(n, total, log_batch) {
                observer.on_progress(n, total);
            }
            (symbol.clone(), result)
        })
        .collect();

    let mut prepared = PreparedUniverse::default();
    for (symbol, result) in results {
        match result {
            Ok(series) => {
                prepared.series.insert(symbol, series);
            }
            Err(reason) => prepared.skipped.push(SkippedSymbol { symbol, reason }),
        }
    }

    if !prepared.skipped.is_empty() {
        let short = prepared
            .skipped
            .iter()
            .filter(|s| matches!(s.reason, PrepareError::InsufficientBars { .. }))
            .count();
        warn!(
            "{}: skipped {} of {} symbols ({} with too few bars, {} with bad data)",
            system.name(),
            prepared.skipped.len(),
            total,
            short,
            prepared.skipped.len() - short
        );
    }
    observer.on_log(&format!(
        "prepared {} symbols, skipped {}",
        prepared.series.len(),
        prepared.skipped.len()
    ));
    prepared
}
