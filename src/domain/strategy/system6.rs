//! System 6: short blow-off fade.
//!
//! Shorts liquid names up more than 20% over six bars after two up closes,
//! ranked by that return. Sells a limit 5% above the prior close. The profit
//! target is checked before the stop; a 5% gain fills at the next close, and
//! the position closes three bars after entry at the close. A stop-out inside
//! the window re-enters short at the stop bar's close.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::hooks;
use crate::domain::strategy::{
    EntryPlan, EntryRule, ExitRules, Fill, PriceField, RankOrder, Ranking, Side, StopRule, Target,
    TimeExit, TradeLeg, TradingSystem, two_up_closes, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system6";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System6Params {
    pub min_bars: usize,
    pub min_close: f64,
    pub min_dollar_volume: f64,
    pub return_window: usize,
    pub min_return: f64,
    pub atr_window: usize,
    pub limit_offset: f64,
    pub stop_atr_multiple: f64,
    pub profit_target: f64,
    pub hold_bars: usize,
}

impl Default for System6Params {
    fn default() -> Self {
        Self {
            min_bars: 50,
            min_close: 5.0,
            min_dollar_volume: 10_000_000.0,
            return_window: 6,
            min_return: 0.20,
            atr_window: 10,
            limit_offset: 0.05,
            stop_atr_multiple: 3.0,
            profit_target: 0.05,
            hold_bars: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System6 {
    pub params: System6Params,
    pub risk: RiskConfig,
}

impl System6 {
    pub fn new(params: System6Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System6Params::default();
        let params = System6Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            min_close: config.get_double(SECTION, "min_close", d.min_close),
            min_dollar_volume: config.get_double(SECTION, "min_dollar_volume", d.min_dollar_volume),
            return_window: window_param(config, SECTION, "return_window", d.return_window),
            min_return: config.get_double(SECTION, "min_return", d.min_return),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            limit_offset: config.get_double(SECTION, "limit_offset", d.limit_offset),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            profit_target: config.get_double(SECTION, "profit_target", d.profit_target),
            hold_bars: window_param(config, SECTION, "hold_bars", d.hold_bars),
        };
        Self::new(params, base_risk.with_overrides(config, SECTION))
    }

    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_first: false,
            target: Some((Target::GainOnClose(self.params.profit_target), Fill::NextClose)),
            time_exit: Some(TimeExit {
                bars: self.params.hold_bars,
                price: PriceField::Close,
            }),
            reenter: true,
        }
    }
}

impl TradingSystem for System6 {
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
            IndicatorType::DollarVolume(50),
            IndicatorType::Return(p.return_window),
            IndicatorType::Atr(p.atr_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let (Some(dv), Some(ret)) = (
            series.value(IndicatorType::DollarVolume(50), index),
            series.value(IndicatorType::Return(p.return_window), index),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        close > p.min_close
            && dv > p.min_dollar_volume
            && ret > p.min_return
            && two_up_closes(series, index)
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: Some(IndicatorType::Return(self.params.return_window)),
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
        EntryRule::Limit {
            offset: self.params.limit_offset,
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
