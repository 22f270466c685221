//! System 7: short the market benchmark on a fresh 50-bar closing low.
//!
//! Runs on the benchmark series only. Covers when the day's high touches the
//! 70-bar highest close, filling at the next open; otherwise holds until the
//! stop or the end of data.
//!
//! The setup compares the close with the 50-bar lowest close by default;
//! `[system7] setup_on_low = true` compares the day's low instead.

use crate::domain::config::RiskConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::hooks;
use crate::domain::strategy::{
    EntryPlan, ExitRules, Fill, RankOrder, Ranking, Side, StopRule, Target, TradeLeg,
    TradingSystem, UniverseScope, window_param,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "system7";

/// Position cap used unless `[system7] max_position_pct` is set.
pub const DEFAULT_MAX_POSITION_PCT: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System7Params {
    pub min_bars: usize,
    pub low_window: usize,
    pub high_window: usize,
    pub atr_window: usize,
    pub stop_atr_multiple: f64,
    /// Test the bar's low against the lowest close instead of its close.
    pub setup_on_low: bool,
}

impl Default for System7Params {
    fn default() -> Self {
        Self {
            min_bars: 70,
            low_window: 50,
            high_window: 70,
            atr_window: 50,
            stop_atr_multiple: 3.0,
            setup_on_low: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct System7 {
    pub params: System7Params,
    pub risk: RiskConfig,
}

impl System7 {
    pub fn new(params: System7Params, risk: RiskConfig) -> Self {
        Self { params, risk }
    }

    pub fn from_config(config: &dyn ConfigPort, base_risk: RiskConfig) -> Self {
        let d = System7Params::default();
        let params = System7Params {
            min_bars: window_param(config, SECTION, "min_bars", d.min_bars),
            low_window: window_param(config, SECTION, "low_window", d.low_window),
            high_window: window_param(config, SECTION, "high_window", d.high_window),
            atr_window: window_param(config, SECTION, "atr_window", d.atr_window),
            stop_atr_multiple: config.get_double(SECTION, "stop_atr_multiple", d.stop_atr_multiple),
            setup_on_low: config.get_bool(SECTION, "setup_on_low", d.setup_on_low),
        };
        let base = RiskConfig {
            max_position_pct: DEFAULT_MAX_POSITION_PCT,
            ..base_risk
        };
        Self::new(params, base.with_overrides(config, SECTION))
    }

    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_first: true,
            target: Some((
                Target::TouchColumn(IndicatorType::HighestClose(self.params.high_window)),
                Fill::NextOpen,
            )),
            time_exit: None,
            reenter: false,
        }
    }
}

impl TradingSystem for System7 {
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
            IndicatorType::LowestClose(p.low_window),
            IndicatorType::HighestClose(p.high_window),
            IndicatorType::Atr(p.atr_window),
        ]
    }

    fn is_setup(&self, series: &PriceSeries, index: usize) -> bool {
        match series.value(IndicatorType::LowestClose(self.params.low_window), index) {
            Some(lowest) => {
                let bar = &series.bars[index];
                let price = if self.params.setup_on_low { bar.low } else { bar.close };
                price <= lowest
            }
            None => false,
        }
    }

    fn ranking(&self) -> Ranking {
        Ranking {
            metric: None,
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

    fn scope(&self) -> UniverseScope {
        UniverseScope::MarketOnly
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::candidate::Candidate;
    use crate::domain::strategy::test_support::{day, flat_series, set_value};

    fn system() -> System7 {
        System7::new(System7Params::default(), RiskConfig::default())
    }

    #[test]
    fn setup_on_new_closing_low() {
        let mut s = flat_series(3, 400.0, 1_000_000);
        set_value(&mut s, IndicatorType::LowestClose(50), 1, 400.0);
        set_value(&mut s, IndicatorType::LowestClose(50), 2, 390.0);
        assert!(system().is_setup(&s, 1));
        assert!(!system().is_setup(&s, 2));
        assert!(!system().is_setup(&s, 0));
    }

    #[test]
    fn low_based_setup_is_opt_in() {
        // close 400 stays above the 399.8 low mark, the 399.5 low does not
        let mut s = flat_series(3, 400.0, 1_000_000);
        set_value(&mut s, IndicatorType::LowestClose(50), 2, 399.8);
        assert!(!system().is_setup(&s, 2));

        let config = FileConfigAdapter::from_string("[system7]\nsetup_on_low = true\n").unwrap();
        let sys = System7::from_config(&config, RiskConfig::default());
        assert!(sys.params.setup_on_low);
        assert!(sys.is_setup(&s, 2));
    }

    #[test]
    fn position_cap_defaults_to_twenty_percent() {
        let config = FileConfigAdapter::from_string("[backtest]\nmax_position_pct = 0.1\n").unwrap();
        let sys = System7::from_config(&config, RiskConfig::default());
        assert!((sys.risk.max_position_pct - 0.20).abs() < f64::EPSILON);

        let config = FileConfigAdapter::from_string("[system7]\nmax_position_pct = 0.3\n").unwrap();
        let sys = System7::from_config(&config, RiskConfig::default());
        assert!((sys.risk.max_position_pct - 0.30).abs() < f64::EPSILON);
        assert_eq!(sys.scope(), UniverseScope::MarketOnly);
        assert_eq!(sys.ranking().metric, None);
    }

    #[test]
    fn covers_next_open_after_touching_high() {
        let mut s = flat_series(6, 400.0, 1_000_000);
        for i in 0..6 {
            set_value(&mut s, IndicatorType::HighestClose(70), i, 420.0);
        }
        s.bars[3].high = 421.0;
        s.bars[4].open = 418.0;
        let candidate = Candidate {
            symbol: "SPY".into(),
            setup_date: day(0),
            entry_date: day(1),
            rank_value: 0.0,
            atr: Some(10.0),
        };
        let sys = system();
        let plan = sys.compute_entry(&s, &candidate, 100_000.0).unwrap();
        assert!((plan.stop_price - 430.0).abs() < f64::EPSILON);
        let legs = sys.compute_exit(&s, &plan, 10, 100_000.0);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].exit_index, 4);
        assert!((legs[0].exit_price - 418.0).abs() < f64::EPSILON);
    }

    #[test]
    fn holds_to_end_of_data_without_touch() {
        let mut s = flat_series(6, 400.0, 1_000_000);
        for i in 0..6 {
            set_value(&mut s, IndicatorType::HighestClose(70), i, 420.0);
        }
        s.bars[5].close = 380.0;
        let candidate = Candidate {
            symbol: "SPY".into(),
            setup_date: day(0),
            entry_date: day(1),
            rank_value: 0.0,
            atr: Some(10.0),
        };
        let sys = system();
        let plan = sys.compute_entry(&s, &candidate, 100_000.0).unwrap();
        let legs = sys.compute_exit(&s, &plan, 10, 100_000.0);
        assert_eq!(legs[0].exit_index, 5);
        assert!((legs[0].exit_price - 380.0).abs() < f64::EPSILON);
    }
}
