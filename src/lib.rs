//! madtrader: Moving Average Distance long/short equity strategy.
//!
//! Hexagonal architecture: ranking and rebalancing logic in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
