//! System 2: short RSI thrust.
//!
//! Shorts liquid names after two up closes that push RSI3 above 90, ranked by
//! ADX7. The open must gap at least 4% above the prior close. Exits on the
//! stop, on a 4% gain at the close (next open), or after two bars (next
//! open). A stop-out inside the window re-enters short at that bar's close.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::hooks;
use crate::domain::strategy::{
    EntryPlan, EntryRule, ExitRules, Fill, PriceField, RankOrder, Ranking, Side, StopRule, Target,
    TimeExit, TradeLeg, TradingSystem, two_up_closes, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system2";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System2Params {
    pub min_bars: usize,
    pub min_close: f64,
    pub min_dollar_volume: f64,
    pub min_atr_ratio: f64,
    pub rsi_window: usize,
    pub min_rsi: f64,
    pub adx_window: usize,
    pub atr_window: usize,
    pub entry_gap: f64,
    pub stop_atr_multiple: f64,
    pub profit_target: f64,
    pub hold_bars: usize,
}

impl Default for System2Params {
    fn default() -> Self {
        Self {
            min_bars: 20,
            min_close: 5.0,
            min_dollar_volume: 25_000_000.0,
            min_atr_ratio: 0.03,
            rsi_window: 3,
            min_rsi: 90.0,
            adx_window: 7,
            atr_window: 10,
            entry_gap: 0.04,
            stop_atr_multiple: 3.0,
            profit_target: 0.04,
            hold_bars: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System2 {
    pub params: System2Params,
    pub risk: RiskConfig,
}

impl System2 {
    pub fn new(params: System2Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System2Params::default();
        let params = System2Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            min_close: config.get_double(SECTION, "min_close", d.min_close),
            min_dollar_volume: config.get_double(SECTION, "min_dollar_volume", d.min_dollar_volume),
            min_atr_ratio: config.get_double(SECTION, "min_atr_ratio", d.min_atr_ratio),
            rsi_window: window_param(config, SECTION, "rsi_window", d.rsi_window),
            min_rsi: config.get_double(SECTION, "min_rsi", d.min_rsi),
            adx_window: window_param(config, SECTION, "adx_window", d.adx_window),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            entry_gap: config.get_double(SECTION, "entry_gap", d.entry_gap),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            profit_target: config.get_double(SECTION, "profit_target", d.profit_target),
            hold_bars: window_param(config, SECTION, "hold_bars", d.hold_bars),
        };
        Self::new(params, base_risk.with_overrides(config, SECTION))
    }

    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_first: true,
            target: Some((Target::GainOnClose(self.params.profit_target), Fill::NextOpen)),
            time_exit: Some(TimeExit {
                bars: self.params.hold_bars,
                price: PriceField::Open,
            }),
            reenter: true,
        }
    }
}

impl TradingSystem for System2 {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn side(&self) -> Side {
        Side::Short
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn columns(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        vec![
            IndicatorType::DollarVolume(20),
            IndicatorType::Atr(p.atr_window),
            IndicatorType::Rsi(p.rsi_window),
            IndicatorType::Adx(p.adx_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let (Some(dv), Some(atr), Some(rsi)) = (
            series.value(IndicatorType::DollarVolume(20), index),
            series.value(IndicatorType::Atr(p.atr_window), index),
            series.value(IndicatorType::Rsi(p.rsi_window), index),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        close > p.min_close
            && dv > p.min_dollar_volume
            && atr / close > p.min_atr_ratio
            && rsi > p.min_rsi
            && two_up_closes(series, index)
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: Some(IndicatorType::Adx(self.params.adx_window)),
            order: RankOrder::Descending,
        }
    }

    fn stop_rule(&self) -> StopRule {
        StopRule {
            atr: IndicatorType::Atr(self.params.atr_window),
            multiple: self.params.stop_atr_multiple,
        }
    }

    fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    fn entry_rule(&self) -> EntryRule {
        EntryRule::GapOpen {
            min_gap: self.params.entry_gap,
        }
    }

    fn compute_exit(
        &self,
        series: &PriceSeries,
        plan: &EntryPlan,
        shares: u64,
        capital: f64,
    ) -> Vec<TradeLeg> {
        hooks::scan_exit(self, series, plan, shares, capital, &self.exit_rules())
    }
}
