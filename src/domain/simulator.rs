//! Day-by-day portfolio simulation.
//!
//! Walks the candidate dates plus every scheduled exit date in order. On each
//! date exits are credited first, then the free slots are filled from that
//! date's candidates in rank order, skipping symbols already held. A pick
//! that is rejected does not pass its slot further down the ranking. A position's whole lifetime is decided on
//! entry by the system's exit hook, so the loop only has to remember when each
//! slot frees up and how much it returns.

use crate::domain::candidate::{Candidate, CandidatesByDate};
use crate::domain::portfolio::{CapitalPoint, Portfolio};
use crate::domain::position::{ActivePosition, Trade};
use crate::domain::price_series::PriceSeries;
use crate::domain::progress::{ProgressObserver, at_cadence};
use crate::domain::sizing;
use crate::domain::strategy::{Rejection, TradingSystem};
use chrono::NaiveDate;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub system: String,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub trades: Vec<Trade>,
    pub capital_log: Vec<CapitalPoint>,
    pub rejections: BTreeMap<Rejection, usize>,
}

impl SimulationResult {
    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }
}

struct Opened {
    position: ActivePosition,
    trades: Vec<Trade>,
}

pub fn simulate(
    system: &dyn TradingSystem,
    prepared: &BTreeMap<String, PriceSeries>,
    candidates: &CandidatesByDate,
    initial_capital: f64,
    progress_every: usize,
    observer: &dyn ProgressObserver,
) -> SimulationResult {
    let max_positions = system.risk().max_positions;
    let mut portfolio = Portfolio::new(initial_capital);
    let mut rejections: BTreeMap<Rejection, usize> = BTreeMap::new();
    let mut agenda: BTreeSet<NaiveDate> = candidates.keys().copied().collect();
    let total = candidates.len();
    let mut processed = 0;

    while let Some(today) = agenda.pop_first() {
        let realized = portfolio.apply_exits(today);

        if let Some(list) = candidates.get(&today) {
            // a rejected pick leaves its slot empty for the day
            let picks: Vec<&Candidate> = list
                .iter()
                .filter(|c| !portfolio.is_active(&c.symbol))
                .take(portfolio.available_slots(max_positions))
                .collect();
            for candidate in picks {
                match open_position(system, prepared, candidate, portfolio.capital) {
                    Ok(opened) => {
                        agenda.insert(opened.position.exit_date);
                        for trade in opened.trades {
                            portfolio.record_trade(trade);
                        }
                        portfolio.open(opened.position);
                    }
                    Err(reason) => {
                        debug!("{} {} rejected: {}", today, candidate.symbol, reason);
                        *rejections.entry(reason).or_default() += 1;
                    }
                }
            }

            processed += 1;
            if at_cadence(processed, total, progress_every) {
                observer.on_progress(processed, total);
            }
        }

        portfolio.log_capital(today, realized);
    }

    observer.on_log(&format!(
        "{} trades, final capital {:.2}",
        portfolio.trades.len(),
        portfolio.capital
    ));

    SimulationResult {
        system: system.name().to_string(),
        initial_capital,
        final_capital: portfolio.capital,
        trades: portfolio.trades,
        capital_log: portfolio.capital_log,
        rejections,
    }
}

fn open_position(
    system: &dyn TradingSystem,
    prepared: &BTreeMap<String, PriceSeries>,
    candidate: &Candidate,
    capital: f64,
) -> Result<Opened, Rejection> {
    let series = prepared
        .get(&candidate.symbol)
        .ok_or(Rejection::MissingEntryDate)?;
    let plan = system.compute_entry(series, candidate, capital)?;

    let risk = system.risk();
    let shares = sizing::size(
        capital,
        plan.entry_price,
        plan.stop_price,
        risk.risk_pct,
        risk.max_position_pct,
    );
    if shares == 0 {
        return Err(if plan.entry_price > capital {
            Rejection::InsufficientCapital
        } else {
            Rejection::ZeroShares
        });
    }

    let legs = system.compute_exit(series, &plan, shares, capital);
    let Some(last_leg) = legs.last() else {
        return Err(Rejection::NoForwardBars);
    };
    let exit_date = series.bars[last_leg.exit_index].date;

    let trades: Vec<Trade> = legs
        .iter()
        .map(|leg| {
            let pnl = system.compute_pnl(leg.entry_price, leg.exit_price, leg.shares);
            Trade {
                symbol: candidate.symbol.clone(),
                entry_date: series.bars[leg.entry_index].date,
                exit_date: series.bars[leg.exit_index].date,
                entry_price: leg.entry_price,
                exit_price: leg.exit_price,
                shares: leg.shares,
                pnl,
                return_pct: pnl / capital * 100.0,
            }
        })
        .collect();

    Ok(Opened {
        position: ActivePosition {
            symbol: candidate.symbol.clone(),
            entry_date: candidate.entry_date,
            exit_date,
            realized_pnl: trades.iter().map(|t| t.pnl).sum(),
        },
        trades,
    })
}
