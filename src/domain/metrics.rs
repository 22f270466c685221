//! Ledger summary statistics.

use crate::domain::position::Trade;
use crate::domain::simulator::SimulationResult;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Largest peak-to-trough fall of cumulative PnL, in currency.
    pub max_drawdown: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(result: &SimulationResult) -> Self {
        let trades = &result.trades;
        let initial_capital = result.initial_capital;

        let total_return = if initial_capital > 0.0 {
            (result.final_capital - initial_capital) / initial_capital
        } else {
            0.0
        };

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if trade.is_win() {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            total_duration_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_duration_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_trades,
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
            final_capital: result.final_capital,
            total_return,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            max_drawdown: compute_drawdown(trades),
            avg_trade_duration,
        }
    }
}

/// Drawdown of the cumulative PnL curve with trades ordered by exit date.
fn compute_drawdown(trades: &[Trade]) -> f64 {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.exit_date);

    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for trade in ordered {
        cumulative += trade.pnl;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

/// Per-symbol trade summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
}

impl SymbolResult {
    /// One row per traded symbol, sorted by total PnL, best first.
    pub fn compute_per_symbol(trades: &[Trade]) -> Vec<SymbolResult> {
        let mut by_symbol: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();
        for trade in trades {
            let entry = by_symbol.entry(trade.symbol.as_str()).or_default();
            entry.0 += 1;
            if trade.is_win() {
                entry.1 += 1;
            }
            entry.2 += trade.pnl;
        }

        let mut results: Vec<SymbolResult> = by_symbol
            .into_iter()
            .map(|(symbol, (total, won, pnl))| SymbolResult {
                symbol: symbol.to_string(),
                total_trades: total,
                winning_trades: won,
                total_pnl: pnl,
                win_rate: won as f64 / total as f64,
            })
            .collect();
        results.sort_by(|a, b| b.total_pnl.total_cmp(&a.total_pnl));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_trade(symbol: &str, pnl: f64, exit_day: i64) -> Trade {
        let entry_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Trade {
            symbol: symbol.to_string(),
            entry_date,
            exit_date: entry_date + chrono::Duration::days(exit_day),
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 100.0,
            shares: 100,
            pnl,
            return_pct: pnl / 100_000.0 * 100.0,
        }
    }

    fn make_result(trades: Vec<Trade>) -> SimulationResult {
        let pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        SimulationResult {
            system: "system1".to_string(),
            initial_capital: 100_000.0,
            final_capital: 100_000.0 + pnl,
            trades,
            capital_log: vec![],
            rejections: BTreeMap::new(),
        }
    }

    #[test]
    fn metrics_empty_ledger() {
        let metrics = Metrics::compute(&make_result(vec![]));
        assert_eq!(metrics.total_trades, 0);
        assert!((metrics.total_return - 0.0).abs() < f64::EPSILON);
        assert!((metrics.win_rate - 0.0).abs() < f64::EPSILON);
        assert!((metrics.profit_factor - 0.0).abs() < f64::EPSILON);
        assert!((metrics.max_drawdown - 0.0).abs() < f64::EPSILON);
        assert!((metrics.avg_trade_duration - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_wins_losses_and_breakeven() {
        let trades = vec![
            make_trade("A", 100.0, 5),
            make_trade("B", -50.0, 3),
            make_trade("C", 200.0, 10),
            make_trade("D", 0.0, 1),
        ];
        let metrics = Metrics::compute(&make_result(trades));
        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.trades_won, 2);
        assert_eq!(metrics.trades_lost, 1);
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((metrics.total_pnl - 250.0).abs() < 1e-9);
        assert!((metrics.total_return - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn metrics_profit_factor_and_averages() {
        let trades = vec![
            make_trade("A", 100.0, 5),
            make_trade("B", -60.0, 3),
            make_trade("C", 200.0, 10),
            make_trade("D", -40.0, 2),
        ];
        let metrics = Metrics::compute(&make_result(trades));
        assert!((metrics.profit_factor - 3.0).abs() < 1e-9);
        assert!((metrics.avg_win - 150.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 50.0).abs() < 1e-9);
        assert!((metrics.largest_win - 200.0).abs() < 1e-9);
        assert!((metrics.largest_loss - 60.0).abs() < 1e-9);
        assert!((metrics.avg_trade_duration - 5.0).abs() < 1e-9);
    }

    #[test]
    fn profit_factor_without_losses_is_infinite() {
        let metrics = Metrics::compute(&make_result(vec![make_trade("A", 10.0, 1)]));
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn drawdown_follows_exit_order() {
        // by exit date: +100, -150, +30, -40 -> peak 100, trough -60
        let trades = vec![
            make_trade("D", -40.0, 9),
            make_trade("A", 100.0, 1),
            make_trade("C", 30.0, 5),
            make_trade("B", -150.0, 3),
        ];
        assert!((compute_drawdown(&trades) - 160.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_from_zero_when_first_trade_loses() {
        let trades = vec![make_trade("A", -25.0, 1), make_trade("B", 10.0, 2)];
        assert!((compute_drawdown(&trades) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn per_symbol_sorted_by_pnl() {
        let trades = vec![
            make_trade("AAA", 50.0, 1),
            make_trade("BBB", 300.0, 2),
            make_trade("AAA", -20.0, 3),
        ];
        let rows = SymbolResult::compute_per_symbol(&trades);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "BBB");
        assert_eq!(rows[1].total_trades, 2);
        assert_eq!(rows[1].winning_trades, 1);
        assert!((rows[1].total_pnl - 30.0).abs() < 1e-9);
        assert!((rows[1].win_rate - 0.5).abs() < f64::EPSILON);
    }
}
