//! Port traits decoupling the strategy from data, configuration and order
//! routing.

pub mod config_port;
pub mod data_port;
pub mod weight_sink;
