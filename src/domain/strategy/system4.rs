//! System 4: long trend following in low-volatility names.
//!
//! Close above SMA200 with annualised volatility between 10% and 40% and a
//! rising benchmark. Ranked by RSI4, most oversold first. Enters at the open
//! with a stop 1.5 x ATR40 below, trails 20% and closes after 30 bars.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::{
    RankOrder, Ranking, Side, StopRule, TradingSystem, TrailingStop, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system4";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System4Params {
    pub min_bars: usize,
    pub trend_sma: usize,
    pub min_close: f64,
    pub min_avg_volume: f64,
    pub min_dollar_volume: f64,
    pub hv_window: usize,
    pub min_hv: f64,
    pub max_hv: f64,
    pub rsi_window: usize,
    pub atr_window: usize,
    pub stop_atr_multiple: f64,
    pub trailing_pct: f64,
    pub hold_bars: usize,
    pub market_sma: usize,
}

impl Default for System4Params {
    fn default() -> Self {
        Self {
            min_bars: 200,
            trend_sma: 200,
            min_close: 1.0,
            min_avg_volume: 1_000_000.0,
            min_dollar_volume: 100_000_000.0,
            hv_window: 20,
            min_hv: 10.0,
            max_hv: 40.0,
            rsi_window: 4,
            atr_window: 40,
            stop_atr_multiple: 1.5,
            trailing_pct: 0.20,
            hold_bars: 30,
            market_sma: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System4 {
    pub params: System4Params,
    pub risk: RiskConfig,
}

impl System4 {
    pub fn new(params: System4Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System4Params::default();
        let params = System4Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            trend_sma: window_param(config, SECTION, "trend_sma", d.trend_sma),
            min_close: config.get_double(SECTION, "min_close", d.min_close),
            min_avg_volume: config.get_double(SECTION, "min_avg_volume", d.min_avg_volume),
            min_dollar_volume: config.get_double(SECTION, "min_dollar_volume", d.min_dollar_volume),
            hv_window: window_param(config, SECTION, "hv_window", d.hv_window),
            min_hv: config.get_double(SECTION, "min_hv", d.min_hv),
            max_hv: config.get_double(SECTION, "max_hv", d.max_hv),
            rsi_window: window_param(config, SECTION, "rsi_window", d.rsi_window),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            trailing_pct: config.get_double(SECTION, "trailing_pct", d.trailing_pct),
            hold_bars: window_param(config, SECTION, "hold_bars", d.hold_bars),
            market_sma: window_param(config, SECTION, "market_sma", d.market_sma),
        };
        Self::new(params, base_risk.with_overrides(config, SECTION))
    }
}

impl TradingSystem for System4 {
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
            IndicatorType::AvgVolume(50),
            IndicatorType::DollarVolume(50),
            IndicatorType::Hv(p.hv_window),
            IndicatorType::Rsi(p.rsi_window),
            IndicatorType::Atr(p.atr_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        let p = &self.params;
        let (Some(sma), Some(avg_volume), Some(dv), Some(hv)) = (
            series.value(IndicatorType::Sma(p.trend_sma), index),
            series.value(IndicatorType::AvgVolume(50), index),
            series.value(IndicatorType::DollarVolume(50), index),
            series.value(IndicatorType::Hv(p.hv_window), index),
        ) else {
            return false;
        };
        let close = series.bars[index].close;
        close > sma
            && close > p.min_close
            && avg_volume >= p.min_avg_volume
            && dv > p.min_dollar_volume
            && (p.min_hv..=p.max_hv).contains(&hv)
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: Some(IndicatorType::Rsi(self.params.rsi_window)),
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

    fn market_filter(&self) -> Option<usize> {
        Some(self.params.market_sma)
    }

    fn trailing_stop(&self) -> TrailingStop {
        TrailingStop {
            pct: self.params.trailing_pct,
            horizon: Some(self.params.hold_bars),
        }
    }
}
