//! System 5: long mean reversion in strongly trending names.
//!
//! Close more than one ATR above SMA100 with ADX7 above 55 and RSI3 below 50,
//! ranked by ADX7. Entry is a limit 3% below the prior close. Exits on the
//! stop, when the close gains one ATR (next open), or at the open six bars
//! after entry.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::hooks;
use crate::domain::strategy::{
    EntryPlan, EntryRule, ExitRules, Fill, PriceField, RankOrder, Ranking, Side, StopRule, Target,
    TimeExit, TradeLeg, TradingSystem, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system5";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System5Params {
    pub min_bars: usize,
    pub trend_sma: usize,
    pub adx_window: usize,
    pub min_adx: f64,
    pub rsi_window: usize,
    pub max_rsi: f64,
    pub min_avg_volume: f64,
    pub min_dollar_volume: f64,
    pub min_atr_ratio: f64,
    pub atr_window: usize,
    pub limit_offset: f64,
    pub stop_atr_multiple: f64,
    pub target_atr_multiple: f64,
    pub hold_bars: usize,
}

impl Default for System5Params {
    fn default() -> Self {
        Self {
            min_bars: 100,
            trend_sma: 100,
            adx_window: 7,
            min_adx: 55.0,
            rsi_window: 3,
            max_rsi: 50.0,
            min_avg_volume: 500_000.0,
            min_dollar_volume: 2_500_000.0,
            min_atr_ratio: 0.04,
            atr_window: 10,
            limit_offset: 0.03,
            stop_atr_multiple: 3.0,
            target_atr_multiple: 1.0,
            hold_bars: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System5 {
    pub params: System5Params,
    pub risk: RiskConfig,
}

impl System5 {
    pub fn new(params: System5Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System5Params::default();
        let params = System5Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            trend_sma: window_param(config, SECTION, "trend_sma", d.trend_sma),
            adx_window: window_param(config, SECTION, "adx_window", d.adx_window),
            min_adx: config.get_double(SECTION, "min_adx", d.min_adx),
            rsi_window: window_param(config, SECTION, "rsi_window", d.rsi_window),
            max_rsi: config.get_double(SECTION, "max_rsi", d.max_rsi),
            min_avg_volume: config.get_double(SECTION, "min_avg_volume", d.min_avg_volume),
            min_dollar_volume: config.get_double(SECTION, "min_dollar_volume", d.min_dollar_volume),
            min_atr_ratio: config.get_double(SECTION, "min_atr_ratio", d.min_atr_ratio),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            limit_offset: config.get_double(SECTION, "limit_offset", d.limit_offset),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            target_atr_multiple: config.get_double(SECTION, "target_atr_multiple", d.target_atr_multiple),
            hold_bars: window_param(config, SECTION, "hold_bars", d.hold_bars),
        };
        Self::new(params, base_risk.with_overrides(config, SECTION))
    }

    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_first: true,
            target: Some((Target::AtrOnClose(self.params.target_atr_multiple), Fill::NextOpen)),
            time_exit: Some(TimeExit {
                bars: self.params.hold_bars,
                price: PriceField::Open,
            }),
            reenter: false,
        }
    }
}

impl TradingSystem for System5 {
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
            IndicatorType::Atr(p.atr_window),
            IndicatorType::Adx(p.adx_window),
            IndicatorType::Rsi(p.rsi_window),
            IndicatorType::AvgVolume(50),
            IndicatorType::DollarVolume(50),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let value = |kind| series.value(kind, index);
        let (Some(sma), Some(atr), Some(adx), Some(rsi), Some(avg_volume), Some(dv)) = (
            value(IndicatorType::Sma(p.trend_sma)),
            value(IndicatorType::Atr(p.atr_window)),
            value(IndicatorType::Adx(p.adx_window)),
            value(IndicatorType::Rsi(p.rsi_window)),
            value(IndicatorType::AvgVolume(50)),
            value(IndicatorType::DollarVolume(50)),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        close > sma + atr
            && adx > p.min_adx
            && rsi < p.max_rsi
            && avg_volume > p.min_avg_volume
            && dv > p.min_dollar_volume
            && atr / close > p.min_atr_ratio
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
