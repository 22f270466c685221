//! Core domain types and logic.

pub mod candidate;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod prepare;
pub mod price_series;
pub mod progress;
pub mod runner;
pub mod simulator;
pub mod sizing;
pub mod strategy;
pub mod universe;
