//! Per-symbol price series with indicator columns.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Daily bars for one symbol, strictly increasing by date, plus indicator
/// columns appended during preparation and the per-bar setup flag.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub columns: HashMap<IndicatorType, IndicatorSeries>,
    pub setup: Vec<bool>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        let setup = vec![false; bars.len()];
        Self {
            symbol: symbol.into(),
            bars,
            columns: HashMap::new(),
            setup,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// Index of the latest bar dated on or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by(|b| b.date.cmp(&date)) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// Computes and stores each column that is not already present.
    pub fn add_columns(&mut self, kinds: &[IndicatorType]) {
        for kind in kinds {
            if !self.columns.contains_key(kind) {
                let series = kind.compute(&self.bars);
                self.columns.insert(*kind, series);
            }
        }
    }

    /// Indicator value at `index`, `None` while warming up or if the column is absent.
    pub fn value(&self, kind: IndicatorType, index: usize) -> Option<f64> {
        self.columns.get(&kind).and_then(|s| s.get(index))
    }
}
