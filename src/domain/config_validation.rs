//! Configuration validation.
//!
//! Checks every section before a backtest or ranking pass runs.

use crate::domain::backtest::DEFAULT_FEE_RATE;
use crate::domain::error::MadError;
use crate::domain::mad::MadParams;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MadError> {
    validate_data_path(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_universe_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MadError> {
    validate_initial_capital(config)?;
    validate_fee_rate(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_codes(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), MadError> {
    let params = read_mad_params(config)?;
    params
        .validate()
        .map_err(|e| invalid("strategy", e.key(), e.to_string()))
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), MadError> {
    let min_price = config.get_double("universe", "min_price", 5.0);
    if min_price < 0.0 {
        return Err(invalid("universe", "min_price", "min_price must be non-negative"));
    }
    if config.get_int("universe", "coarse_count", 500) <= 0 {
        return Err(invalid("universe", "coarse_count", "coarse_count must be positive"));
    }
    if let Some(exchanges) = config.get_string("universe", "exchanges") {
        parse_codes(&exchanges).map_err(|e| invalid("universe", "exchanges", e.to_string()))?;
    }
    Ok(())
}

/// Read `[strategy]` periods and thresholds, falling back to defaults.
pub fn read_mad_params(config: &dyn ConfigPort) -> Result<MadParams, MadError> {
    let defaults = MadParams::default();
    let short_period = read_period(config, "short_period", defaults.short_period)?;
    let long_period = read_period(config, "long_period", defaults.long_period)?;
    Ok(MadParams {
        short_period,
        long_period,
        long_threshold: config.get_double("strategy", "long_threshold", defaults.long_threshold),
        short_threshold: config.get_double(
            "strategy",
            "short_threshold",
            defaults.short_threshold,
        ),
    })
}

fn read_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MadError> {
    let value = config.get_int("strategy", key, default as i64);
    if value <= 0 {
        return Err(invalid("strategy", key, format!("{} must be positive", key)));
    }
    Ok(value as usize)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MadError {
    MadError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), MadError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MadError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), MadError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), MadError> {
    let value = config.get_double("backtest", "fee_rate", DEFAULT_FEE_RATE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "fee_rate",
            "fee_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MadError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MadError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MadError> {
    match value {
        None => Err(MadError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), MadError> {
    match config.get_string("backtest", "codes") {
        Some(c) if !c.trim().is_empty() => parse_codes(&c)
            .map(|_| ())
            .map_err(|e| invalid("backtest", "codes", e.to_string())),
        _ => Ok(()),
    }
}
