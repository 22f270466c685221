//! Candidate generation and same-day ranking.

use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::progress::{ProgressObserver, at_cadence};
use crate::domain::strategy::{RankOrder, TradingSystem};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// A symbol eligible for entry on `entry_date`, the bar after its setup bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub setup_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub rank_value: f64,
    /// Stop-sizing volatility read on the setup bar.
    pub atr: Option<f64>,
}

/// Ranked candidates per entry date. Dates without candidates are absent.
pub type CandidatesByDate = BTreeMap<NaiveDate, Vec<Candidate>>;

/// Scans setup flags and groups candidates by entry date, ranked and
/// truncated to `top_n`.
///
/// Symbols are visited in `order` first, then any remaining ones in map
/// order, and ties keep that visiting order. With a market filter, a setup
/// counts only when the latest benchmark bar at or before the setup date
/// closes above its SMA; without a benchmark series such a system yields
/// nothing.
pub fn generate(
    system: &dyn TradingSystem,
    prepared: &BTreeMap<String, PriceSeries>,
    order: &[String],
    market: Option<&PriceSeries>,
    top_n: usize,
    log_batch: usize,
    observer: &dyn ProgressObserver,
) -> CandidatesByDate {
    let mut by_date = CandidatesByDate::new();
    let total = prepared.len();
    let atr_column = system.stop_rule().atr;

    for (done, series) in visiting_order(prepared, order).into_iter().enumerate() {
        for index in 0..series.len() {
            if !series.setup.get(index).copied().unwrap_or(false) {
                continue;
            }
            let Some(next) = series.bars.get(index + 1) else {
                continue;
            };
            let setup_date = series.bars[index].date;
            if !market_allows(system.market_filter(), market, setup_date) {
                continue;
            }
            let Some(rank_value) = system.rank_value(series, index).filter(|v| v.is_finite()) else {
                continue;
            };
            by_date.entry(next.date).or_default().push(Candidate {
                symbol: series.symbol.clone(),
                setup_date,
                entry_date: next.date,
                rank_value,
                atr: series.value(atr_column, index),
            });
        }

        if at_cadence(done + 1, total, log_batch) {
            observer.on_progress(done + 1, total);
        }
    }

    let order = system.ranking().order;
    for candidates in by_date.values_mut() {
        candidates.sort_by(|a, b| compare(order, a.rank_value, b.rank_value));
        candidates.truncate(top_n);
    }
    by_date.retain(|_, candidates| !candidates.is_empty());

    observer.on_log(&format!(
        "{} candidate dates, {} candidates",
        by_date.len(),
        by_date.values().map(Vec::len).sum::<usize>()
    ));
    by_date
}

fn visiting_order<'a>(prepared: &'a BTreeMap<String, PriceSeries>, order: &[String]) -> Vec<&'a PriceSeries> {
    let listed: HashSet<&str> = order.iter().map(String::as_str).collect();
    order
        .iter()
        .filter_map(|symbol| prepared.get(symbol))
        .chain(
            prepared
                .iter()
                .filter(|(symbol, _)| !listed.contains(symbol.as_str()))
                .map(|(_, series)| series),
        )
        .collect()
}

fn compare(order: RankOrder, a: f64, b: f64) -> Ordering {
    match order {
        RankOrder::Descending => b.total_cmp(&a),
        RankOrder::Ascending => a.total_cmp(&b),
    }
}

fn market_allows(filter: Option<usize>, market: Option<&PriceSeries>, setup_date: NaiveDate) -> bool {
    let Some(window) = filter else {
        return true;
    };
    let Some(market) = market else {
        return false;
    };
    let Some(index) = market.index_at_or_before(setup_date) else {
        return false;
    };
    match market.value(IndicatorType::Sma(window), index) {
        Some(sma) => market.bars[index].close > sma,
        None => false,
    }
}
