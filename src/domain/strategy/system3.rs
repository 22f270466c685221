//! System 3: long mean reversion after a sharp sell-off.
//!
//! Buys names in a long-term uptrend (close above SMA150) that fell 12.5% or
//! more over three days, ranked by the deepest drop. Entry is a limit 7%
//! below the prior close. Exits on the stop, on a 4% gain at the close (next
//! close), or at the close three bars after entry.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::hooks;
use crate::domain::strategy::{
    EntryPlan, EntryRule, ExitRules, Fill, PriceField, RankOrder, Ranking, Side, StopRule, Target,
    TimeExit, TradeLeg, TradingSystem, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system3";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System3Params {
    pub min_bars: usize,
    pub trend_sma: usize,
    pub drop_window: usize,
    pub max_drop: f64,
    pub min_close: f64,
    pub min_avg_volume: f64,
    pub min_atr_ratio: f64,
    pub atr_window: usize,
    pub limit_offset: f64,
    pub stop_atr_multiple: f64,
    pub profit_target: f64,
    pub hold_bars: usize,
}

impl Default for System3Params {
    fn default() -> Self {
        Self {
            min_bars: 150,
            trend_sma: 150,
            drop_window: 3,
            max_drop: -0.125,
            min_close: 1.0,
            min_avg_volume: 1_000_000.0,
            min_atr_ratio: 0.05,
            atr_window: 10,
            limit_offset: 0.07,
            stop_atr_multiple: 2.5,
            profit_target: 0.04,
            hold_bars: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System3 {
    pub params: System3Params,
    pub risk: RiskConfig,
}

impl System3 {
    pub fn new(params: System3Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System3Params::default();
        let params = System3Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            trend_sma: window_param(config, SECTION, "trend_sma", d.trend_sma),
            drop_window: window_param(config, SECTION, "drop_window", d.drop_window),
            max_drop: config.get_double(SECTION, "max_drop", d.max_drop),
            min_close: config.get_double(SECTION, "min_close", d.min_close),
            min_avg_volume: config.get_double(SECTION, "min_avg_volume", d.min_avg_volume),
            min_atr_ratio: config.get_double(SECTION, "min_atr_ratio", d.min_atr_ratio),
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
            stop_first: true,
            target: Some((Target::GainOnClose(self.params.profit_target), Fill::NextClose)),
            time_exit: Some(TimeExit {
                bars: self.params.hold_bars,
                price: PriceField::Close,
            }),
            reenter: false,
        }
    }
}

impl TradingSystem for System3 {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn side(&self) -> Side {
        Side::Long
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn columns(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        vec![
            IndicatorType::Sma(p.trend_sma),
            IndicatorType::Return(p.drop_window),
            IndicatorType::AvgVolume(50),
            IndicatorType::Atr(p.atr_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let (Some(sma), Some(ret), Some(avg_volume), Some(atr)) = (
            series.value(IndicatorType::Sma(p.trend_sma), index),
            series.value(IndicatorType::Return(p.drop_window), index),
            series.value(IndicatorType::AvgVolume(50), index),
            series.value(IndicatorType::Atr(p.atr_window), index),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        close > sma
            && ret <= p.max_drop
            && close > p.min_close
            && avg_volume >= p.min_avg_volume
            && atr / close >= p.min_atr_ratio
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: Some(IndicatorType::Return(self.params.drop_window)),
            order: RankOrder::Ascending,
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
