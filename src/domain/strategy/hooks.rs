//! Shared entry and exit building blocks.
//!
//! Entries fill on the candidate's entry bar. Exits scan forward from the bar
//! after the entry bar; the entry bar itself never closes a position.

use crate::domain::candidate::Candidate;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::sizing;
use crate::domain::strategy::{EntryPlan, Rejection, Side, TradeLeg, TradingSystem};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryRule {
    /// Fill at the entry bar's open.
    Open,
    /// Fill at the open only when it gaps at least `min_gap` beyond the prior
    /// close (above for shorts, below for longs).
    GapOpen { min_gap: f64 },
    /// Limit `offset` away from the prior close (below for longs, above for
    /// shorts), rounded to cents. Rejected when the bar never trades there.
    Limit { offset: f64 },
}

/// Protective stop placed `multiple * column` away from the entry price.
/// The column is read on the bar before the entry bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRule {
    pub atr: IndicatorType,
    pub multiple: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStop {
    pub pct: f64,
    /// Bars held before a time exit at the close; `None` holds to the end of data.
    pub horizon: Option<usize>,
}

impl Default for TrailingStop {
    fn default() -> Self {
        Self {
            pct: 0.25,
            horizon: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Close moved `pct` in the position's favour.
    GainOnClose(f64),
    /// Close moved `k * ATR` in the position's favour.
    AtrOnClose(f64),
    /// Intrabar range touched the column level (high for shorts, low for longs).
    TouchColumn(IndicatorType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    NextOpen,
    NextClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeExit {
    pub bars: usize,
    pub price: PriceField,
}

/// Stop / target / time exit with optional same-slot re-entry after a stop-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    pub stop_first: bool,
    pub target: Option<(Target, Fill)>,
    pub time_exit: Option<TimeExit>,
    pub reenter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Stop,
    Target,
    Time,
    EndOfData,
}

pub fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Entry price and stop for `candidate` under `rule`.
pub fn rule_entry(
    side: Side,
    rule: EntryRule,
    stop: StopRule,
    series: &PriceSeries,
    candidate: &Candidate,
) -> Result<EntryPlan, Rejection> {
    let entry_index = series
        .index_of(candidate.entry_date)
        .ok_or(Rejection::MissingEntryDate)?;
    if entry_index == 0 {
        return Err(Rejection::MissingIndicator);
    }
    if entry_index + 1 >= series.len() {
        return Err(Rejection::NoForwardBars);
    }

    let bar = &series.bars[entry_index];
    let prior_close = series.bars[entry_index - 1].close;

    let entry_price = match (rule, side) {
        (EntryRule::Open, _) => bar.open,
        (EntryRule::GapOpen { min_gap }, Side::Short) => {
            if bar.open < prior_close * (1.0 + min_gap) {
                return Err(Rejection::GapNotMet);
            }
            bar.open
        }
        (EntryRule::GapOpen { min_gap }, Side::Long) => {
            if bar.open > prior_close * (1.0 - min_gap) {
                return Err(Rejection::GapNotMet);
            }
            bar.open
        }
        (EntryRule::Limit { offset }, Side::Long) => {
            let limit = round_cents(prior_close * (1.0 - offset));
            if bar.low > limit {
                return Err(Rejection::LimitNotReached);
            }
            limit
        }
        (EntryRule::Limit { offset }, Side::Short) => {
            let limit = round_cents(prior_close * (1.0 + offset));
            if bar.high < limit {
                return Err(Rejection::LimitNotReached);
            }
            limit
        }
    };

    let atr = candidate
        .atr
        .or_else(|| series.value(stop.atr, entry_index - 1))
        .filter(|v| v.is_finite())
        .ok_or(Rejection::MissingIndicator)?;

    Ok(EntryPlan {
        entry_index,
        entry_price,
        stop_price: side.stop_price(entry_price, stop.multiple * atr),
        atr,
    })
}

/// Percentage trailing stop ratcheting from the best close seen so far.
///
/// The protective stop is checked intrabar first and fills at the stop price.
/// Otherwise the position closes at the first close beyond the trail level,
/// where the level uses the best close before that bar. Without a trigger it
/// closes at the horizon bar's close, or the last bar's close.
pub fn trailing_exit(
    side: Side,
    series: &PriceSeries,
    plan: &EntryPlan,
    shares: u64,
    trailing: TrailingStop,
) -> TradeLeg {
    let last = series.len() - 1;
    let end = trailing
        .horizon
        .map_or(last, |h| (plan.entry_index + h).min(last));
    let mut best = plan.entry_price;

    let leg = |exit_index: usize, exit_price: f64| TradeLeg {
        entry_index: plan.entry_index,
        exit_index,
        entry_price: plan.entry_price,
        exit_price,
        shares,
    };

    for j in plan.entry_index + 1..=end {
        let bar = &series.bars[j];
        if side.stop_hit(bar, plan.stop_price) {
            return leg(j, plan.stop_price);
        }
        let crossed = match side {
            Side::Long => bar.close < best * (1.0 - trailing.pct),
            Side::Short => bar.close > best * (1.0 + trailing.pct),
        };
        if crossed {
            return leg(j, bar.close);
        }
        best = match side {
            Side::Long => best.max(bar.close),
            Side::Short => best.min(bar.close),
        };
    }

    leg(end, series.bars[end].close)
}

/// Stop / target / time exit, optionally re-entering after a stop-out.
///
/// A re-entry opens at the stop bar's close with a fresh stop from that bar's
/// ATR, re-sized against `capital`, and keeps scanning inside the first leg's
/// holding window. The window bounds the number of legs.
pub fn scan_exit(
    system: &dyn TradingSystem,
    series: &PriceSeries,
    plan: &EntryPlan,
    shares: u64,
    capital: f64,
    rules: &ExitRules,
) -> Vec<TradeLeg> {
    let side = system.side();
    let stop = system.stop_rule();
    let risk = system.risk();
    let last = series.len() - 1;
    let window_end = rules
        .time_exit
        .map_or(last, |t| (plan.entry_index + t.bars).min(last));

    let mut legs = Vec::new();
    let mut current = TradeLeg {
        entry_index: plan.entry_index,
        exit_index: plan.entry_index,
        entry_price: plan.entry_price,
        exit_price: plan.entry_price,
        shares,
    };
    let mut stop_price = plan.stop_price;
    let mut atr = plan.atr;

    for _ in 0..window_end.saturating_sub(plan.entry_index).max(1) {
        let (exit_index, exit_price, reason) =
            scan_leg(side, series, &current, stop_price, atr, window_end, rules);
        current.exit_index = exit_index;
        current.exit_price = exit_price;
        legs.push(current);

        if !(rules.reenter && reason == ExitReason::Stop && exit_index < window_end) {
            break;
        }

        let reentry_price = series.bars[exit_index].close;
        let Some(reentry_atr) = series.value(stop.atr, exit_index) else {
            break;
        };
        let reentry_stop = side.stop_price(reentry_price, stop.multiple * reentry_atr);
        let reentry_shares = sizing::size(
            capital,
            reentry_price,
            reentry_stop,
            risk.risk_pct,
            risk.max_position_pct,
        );
        if reentry_shares == 0 {
            break;
        }

        current = TradeLeg {
            entry_index: exit_index,
            exit_index,
            entry_price: reentry_price,
            exit_price: reentry_price,
            shares: reentry_shares,
        };
        stop_price = reentry_stop;
        atr = reentry_atr;
    }

    legs
}

fn scan_leg(
    side: Side,
    series: &PriceSeries,
    leg: &TradeLeg,
    stop_price: f64,
    atr: f64,
    window_end: usize,
    rules: &ExitRules,
) -> (usize, f64, ExitReason) {
    let last = series.len() - 1;
    // an open-priced time exit happens before the window's last bar trades
    let scan_end = match rules.time_exit {
        Some(TimeExit {
            price: PriceField::Open,
            ..
        }) => window_end.saturating_sub(1),
        _ => window_end,
    };

    for j in leg.entry_index + 1..=scan_end {
        let bar = &series.bars[j];
        let stopped = side.stop_hit(bar, stop_price);
        if rules.stop_first && stopped {
            return (j, stop_price, ExitReason::Stop);
        }
        if let Some((target, fill)) = rules.target {
            if target_hit(side, series, j, leg.entry_price, atr, target) {
                let (index, price) = fill_after(series, j, fill);
                return (index, price, ExitReason::Target);
            }
        }
        if stopped {
            return (j, stop_price, ExitReason::Stop);
        }
    }

    match rules.time_exit {
        Some(t) => {
            let bar = &series.bars[window_end];
            let price = match t.price {
                PriceField::Open => bar.open,
                PriceField::Close => bar.close,
            };
            (window_end, price, ExitReason::Time)
        }
        None => (last, series.bars[last].close, ExitReason::EndOfData),
    }
}

fn target_hit(
    side: Side,
    series: &PriceSeries,
    index: usize,
    entry_price: f64,
    atr: f64,
    target: Target,
) -> bool {
    let bar = &series.bars[index];
    match target {
        Target::GainOnClose(pct) => side.gain(entry_price, bar.close) >= pct,
        Target::AtrOnClose(k) => match side {
            Side::Long => bar.close - entry_price >= k * atr,
            Side::Short => entry_price - bar.close >= k * atr,
        },
        Target::TouchColumn(kind) => match (series.value(kind, index), side) {
            (Some(level), Side::Short) => bar.high >= level,
            (Some(level), Side::Long) => bar.low <= level,
            (None, _) => false,
        },
    }
}

/// Fill on the bar after `index`; on the last bar, its own close.
fn fill_after(series: &PriceSeries, index: usize, fill: Fill) -> (usize, f64) {
    match series.bars.get(index + 1) {
        Some(next) => match fill {
            Fill::NextOpen => (index + 1, next.open),
            Fill::NextClose => (index + 1, next.close),
        },
        None => (index, series.bars[index].close),
    }
}
