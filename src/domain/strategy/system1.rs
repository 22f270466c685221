//! System 1: long trend following on high momentum.
//!
//! Setup: SMA25 > SMA50, close above $5, 20-day average dollar volume above
//! $50M, benchmark above its SMA100. Ranked by ROC200, highest first. Enters
//! at the open with a stop 5 x ATR20 below, then trails 25% from the best close.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::{
    RankOrder, Ranking, Side, StopRule, TradingSystem, TrailingStop, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System1Params {
    pub min_bars: usize,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub min_close: f64,
    pub dollar_volume_window: usize,
    pub min_dollar_volume: f64,
    pub roc_window: usize,
    pub atr_window: usize,
    pub stop_atr_multiple: f64,
    pub trailing_pct: f64,
    pub market_sma: usize,
}

impl Default for System1Params {
    fn default() -> Self {
        Self {
            min_bars: 200,
            sma_fast: 25,
            sma_slow: 50,
            min_close: 5.0,
            dollar_volume_window: 20,
            min_dollar_volume: 50_000_000.0,
            roc_window: 200,
            atr_window: 20,
            stop_atr_multiple: 5.0,
            trailing_pct: 0.25,
            market_sma: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System1 {
    pub params: System1Params,
    pub risk: RiskConfig,
}

impl System1 {
    pub fn new(params: System1Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System1Params::default();
        let params = System1Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            sma_fast: window_param(config, SECTION, "sma_fast", d.sma_fast),
            sma_slow: window_param(config, SECTION, "sma_slow", d.sma_slow),
            min_close: config.get_double(SECTION, "min_close", d.min_close),
            dollar_volume_window: window_param(config, SECTION, "dollar_volume_window", d.dollar_volume_window),
            min_dollar_volume: config.get_double(SECTION, "min_dollar_volume", d.min_dollar_volume),
            roc_window: window_param(config, SECTION, "roc_window", d.roc_window),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            trailing_pct: config.get_double(SECTION, "trailing_pct", d.trailing_pct),
            market_sma: window_param(config, SECTION, "market_sma", d.market_sma),
        };
        Self::new(params, base_risk.with_overrides(config, SECTION))
    }
}

impl TradingSystem for System1 {
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
            IndicatorType::Sma(p.sma_fast),
            IndicatorType::Sma(p.sma_slow),
            IndicatorType::DollarVolume(p.dollar_volume_window),
            IndicatorType::Roc(p.roc_window),
            IndicatorType::AtrMean(p.atr_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let (Some(fast), Some(slow), Some(dv)) = (
            series.value(IndicatorType::Sma(p.sma_fast), index),
            series.value(IndicatorType::Sma(p.sma_slow), index),
            series.value(IndicatorType::DollarVolume(p.dollar_volume_window), index),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        fast > slow && close > p.min_close && dv > p.min_dollar_volume
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: Some(IndicatorType::Roc(self.params.roc_window)),
            order: RankOrder::Descending,
        }
    }

    fn stop_rule(&self) -> StopRule {
        StopRule {
            atr: IndicatorType::AtrMean(self.params.atr_window),
            multiple: self.params.stop_atr_multiple,
        }
    }

    fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    fn market_filter(&self) -> Option<usize> {
        Some(self.params.market_sma)
    }

    fn trailing_stop(&self) -> TrailingStop {
        TrailingStop {
            pct: self.params.trailing_pct,
            horizon: None,
        }
    }
}
