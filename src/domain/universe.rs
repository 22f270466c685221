//! Symbol universe selection and loading.
//!
//! Parses symbol lists from configuration and loads each symbol's bars through
//! a [`DataPort`] on a bounded worker pool. A symbol whose data cannot be read
//! is skipped with a warning; the batch only fails when nothing loads at all.

use crate::domain::error::TradesysError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub market_symbol: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Raw bars for every loaded symbol plus the benchmark, if it loaded.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    /// Loaded symbols in configured order.
    pub symbols: Vec<String>,
    pub universe: BTreeMap<String, Vec<OhlcvBar>>,
    pub market_symbol: String,
    pub market: Option<Vec<OhlcvBar>>,
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Configured symbols, or every symbol the data source knows minus the
/// benchmark when no list is configured.
pub fn resolve_universe(
    data_port: &dyn DataPort,
    configured: Option<&str>,
    market_symbol: &str,
) -> Result<Universe, TradesysError> {
    let symbols = match configured {
        Some(list) => parse_symbols(list)
            .map_err(|e| TradesysError::invalid("data", "symbols", e.to_string()))?,
        None => data_port
            .list_symbols()?
            .into_iter()
            .filter(|s| !s.eq_ignore_ascii_case(market_symbol))
            .collect(),
    };
    Ok(Universe {
        symbols,
        market_symbol: market_symbol.to_string(),
    })
}

pub fn load_market_data(
    data_port: &dyn DataPort,
    universe: &Universe,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    threads: usize,
) -> Result<MarketData, TradesysError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| TradesysError::Data {
            reason: format!("failed to start loader pool: {e}"),
        })?;

    let fetched: Vec<(String, Result<Vec<OhlcvBar>, TradesysError>)> = pool.install(|| {
        universe
            .symbols
            .par_iter()
            .map(|symbol| (symbol.clone(), data_port.fetch_ohlcv(symbol, start_date, end_date)))
            .collect()
    });

    let mut data = MarketData {
        market_symbol: universe.market_symbol.clone(),
        ..MarketData::default()
    };
    let mut failed = 0usize;
    for (symbol, result) in fetched {
        match result {
            Ok(bars) if !bars.is_empty() => {
                data.symbols.push(symbol.clone());
                data.universe.insert(symbol, bars);
            }
            Ok(_) => {
                warn!("skipping {} (no bars in range)", symbol);
                failed += 1;
            }
            Err(e) => {
                warn!("skipping {} ({})", symbol, e);
                failed += 1;
            }
        }
    }

    data.market = match data.universe.get(&universe.market_symbol) {
        Some(bars) => Some(bars.clone()),
        None => match data_port.fetch_ohlcv(&universe.market_symbol, start_date, end_date) {
            Ok(bars) if !bars.is_empty() => Some(bars),
            Ok(_) => None,
            Err(e) => {
                warn!("market series {} unavailable ({})", universe.market_symbol, e);
                None
            }
        },
    };

    if data.universe.is_empty() && data.market.is_none() {
        return Err(TradesysError::NoData {
            symbol: "all".to_string(),
        });
    }

    info!(
        "loaded {} of {} symbols{}",
        data.universe.len(),
        universe.count(),
        if failed > 0 {
            format!(", {failed} skipped")
        } else {
            String::new()
        }
    );
    Ok(data)
}
