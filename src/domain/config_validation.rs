//! Configuration validation.
//!
//! Runs before any data is loaded. Every check reports the first offending
//! `[section] key`.

use crate::domain::config::parse_optional_date;
use crate::domain::error::TradesysError;
use crate::domain::strategy::SYSTEM_NAMES;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use log::warn;

const KNOWN_SECTIONS: [&str; 3] = ["data", "backtest", "output"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradesysError> {
    validate_data(config)?;
    validate_backtest(config)?;
    for section in SYSTEM_NAMES {
        validate_risk_section(config, section)?;
        validate_system_constants(config, section)?;
    }
    warn_unknown_sections(config);
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), TradesysError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => {}
        _ => {
            return Err(TradesysError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            });
        }
    }

    if let Some(list) = config.get_string("data", "symbols").filter(|s| !s.trim().is_empty()) {
        parse_symbols(&list).map_err(|e| TradesysError::invalid("data", "symbols", e.to_string()))?;
    }

    if let Some(symbol) = config.get_string("data", "market_symbol") {
        if symbol.trim().is_empty() || symbol.contains(',') {
            return Err(TradesysError::invalid(
                "data",
                "market_symbol",
                "market_symbol must be a single symbol",
            ));
        }
    }

    let start = parse_optional_date(config, "data", "start_date")?;
    let end = parse_optional_date(config, "data", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(TradesysError::invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    at_least_one(config, "data", "threads")
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), TradesysError> {
    if let Some(value) = read_number(config, "backtest", "initial_capital")? {
        if value <= 0.0 {
            return Err(TradesysError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    at_least_one(config, "backtest", "progress_every")?;
    at_least_one(config, "backtest", "log_batch_size")?;
    validate_risk_section(config, "backtest")
}

fn validate_risk_section(config: &dyn ConfigPort, section: &str) -> Result<(), TradesysError> {
    for key in ["risk_pct", "max_position_pct"] {
        if let Some(value) = read_number(config, section, key)? {
            if value <= 0.0 || value > 1.0 {
                return Err(TradesysError::invalid(
                    section,
                    key,
                    format!("{key} must be in (0, 1]"),
                ));
            }
        }
    }
    at_least_one(config, section, "max_concurrent_positions")?;
    at_least_one(config, section, "top_n_rank")
}

fn validate_system_constants(config: &dyn ConfigPort, section: &str) -> Result<(), TradesysError> {
    for key in ["stop_atr_multiple", "profit_target", "target_atr_multiple"] {
        if let Some(value) = read_number(config, section, key)? {
            if value <= 0.0 {
                return Err(TradesysError::invalid(section, key, format!("{key} must be positive")));
            }
        }
    }
    for key in ["trailing_pct", "limit_offset", "entry_gap"] {
        if let Some(value) = read_number(config, section, key)? {
            if !(0.0..1.0).contains(&value) {
                return Err(TradesysError::invalid(section, key, format!("{key} must be in [0, 1)")));
            }
        }
    }
    for key in ["min_bars", "hold_bars"] {
        at_least_one(config, section, key)?;
    }
    Ok(())
}

fn warn_unknown_sections(config: &dyn ConfigPort) {
    for section in config.sections() {
        let known = KNOWN_SECTIONS.contains(&section.as_str()) || SYSTEM_NAMES.contains(&section.as_str());
        if !known {
            warn!("ignoring unknown config section [{}]", section);
        }
    }
}

/// `None` when the key is absent, an error when it is present but not a number.
fn read_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, TradesysError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| TradesysError::invalid(section, key, format!("{raw:?} is not a number"))),
    }
}

fn at_least_one(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TradesysError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 1 => Ok(()),
        _ => Err(TradesysError::invalid(
            section,
            key,
            format!("{key} must be a positive integer"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn valid_config() -> String {
        r#"
[data]
path = /tmp/prices
symbols = AAPL,MSFT
market_symbol = SPY
start_date = 2020-01-01
end_date = 2024-12-31
threads = 4

[backtest]
initial_capital = 100000
risk_pct = 0.02
max_position_pct = 0.10
max_concurrent_positions = 10
top_n_rank = 10

[system2]
profit_target = 0.05
hold_bars = 4

[system7]
max_position_pct = 0.2
"#
        .to_string()
    }

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(result: Result<(), TradesysError>) -> (String, String) {
        match result {
            Err(TradesysError::ConfigInvalid { section, key, .. }) => (section, key),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&adapter(&valid_config())).is_ok());
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate_config(&adapter("[data]\npath = prices\n")).is_ok());
    }

    #[test]
    fn missing_data_path() {
        let result = validate_config(&adapter("[backtest]\ninitial_capital = 5\n"));
        assert!(matches!(
            result,
            Err(TradesysError::ConfigMissing { ref section, ref key }) if section == "data" && key == "path"
        ));
    }

    #[test]
    fn zero_initial_capital() {
        let content = valid_config().replace("initial_capital = 100000", "initial_capital = 0");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("backtest".to_string(), "initial_capital".to_string())
        );
    }

    #[test]
    fn risk_pct_out_of_range() {
        let content = valid_config().replace("risk_pct = 0.02", "risk_pct = 1.5");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("backtest".to_string(), "risk_pct".to_string())
        );
    }

    #[test]
    fn per_system_override_is_checked() {
        let content = valid_config().replace("max_position_pct = 0.2", "max_position_pct = -0.2");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("system7".to_string(), "max_position_pct".to_string())
        );
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let content = valid_config().replace("profit_target = 0.05", "profit_target = lots");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("system2".to_string(), "profit_target".to_string())
        );
    }

    #[test]
    fn zero_hold_bars() {
        let content = valid_config().replace("hold_bars = 4", "hold_bars = 0");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("system2".to_string(), "hold_bars".to_string())
        );
    }

    #[test]
    fn zero_positions() {
        let content = valid_config().replace("max_concurrent_positions = 10", "max_concurrent_positions = 0");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("backtest".to_string(), "max_concurrent_positions".to_string())
        );
    }

    #[test]
    fn start_after_end() {
        let content = valid_config().replace("start_date = 2020-01-01", "start_date = 2025-01-01");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("data".to_string(), "start_date".to_string())
        );
    }

    #[test]
    fn malformed_date() {
        let content = valid_config().replace("end_date = 2024-12-31", "end_date = 31/12/2024");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("data".to_string(), "end_date".to_string())
        );
    }

    #[test]
    fn duplicate_symbols() {
        let content = valid_config().replace("symbols = AAPL,MSFT", "symbols = AAPL,aapl");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("data".to_string(), "symbols".to_string())
        );
    }

    #[test]
    fn zero_threads() {
        let content = valid_config().replace("threads = 4", "threads = 0");
        assert_eq!(
            invalid_key(validate_config(&adapter(&content))),
            ("data".to_string(), "threads".to_string())
        );
    }
}
