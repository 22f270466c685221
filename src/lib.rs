//! tradesys: candidate ranking and risk-managed portfolio simulation for a
//! family of daily-bar trading systems.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
