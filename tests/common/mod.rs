#![allow(dead_code)]

use chrono::NaiveDate;
use madtrader::domain::backtest::BacktestConfig;
use madtrader::domain::code_data::CodeData;
use madtrader::domain::error::MadError;
use madtrader::domain::mad::MadParams;
pub use madtrader::domain::ohlcv::OhlcvBar;
use madtrader::domain::universe::UniverseParams;
use madtrader::ports::data_port::DataPort;
use std::collections::HashMap;

/// In-memory `DataPort` keyed by code; listings come from the bars' exchange.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, exchange: &str, reason: &str) -> Self {
        // Listed but unreadable.
        self.data
            .entry(code.to_string())
            .or_default()
            .push(make_bar(code, exchange, "1900-01-01", 0.0, 0));
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MadError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(MadError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.exchange == exchange)
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, MadError> {
        let mut codes: Vec<String> = self
            .data
            .iter()
            .filter(|(_, bars)| bars.iter().any(|b| b.exchange == exchange))
            .map(|(code, _)| code.clone())
            .collect();
        codes.sort();
        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
        _exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MadError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(MadError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, exchange: &str, date: &str, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        exchange: exchange.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// One bar per calendar day from `start`, closing at `closes[i]`.
pub fn series(code: &str, exchange: &str, start: NaiveDate, closes: &[f64], volume: i64) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            code: code.to_string(),
            exchange: exchange.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

/// Constant price that steps to `after` on `switch` and stays there.
pub fn step_series(
    code: &str,
    exchange: &str,
    start: NaiveDate,
    end: NaiveDate,
    before: f64,
    after: f64,
    switch: NaiveDate,
    volume: i64,
) -> Vec<OhlcvBar> {
    let days = (end - start).num_days() + 1;
    let closes: Vec<f64> = (0..days)
        .map(|i| {
            if start + chrono::Duration::days(i) < switch {
                before
            } else {
                after
            }
        })
        .collect();
    series(code, exchange, start, &closes, volume)
}

pub fn make_code_data(bars: Vec<OhlcvBar>) -> CodeData {
    let code = bars[0].code.clone();
    let exchange = bars[0].exchange.clone();
    CodeData::new(code, exchange, bars)
}

/// Short window 3, long window 10: small enough for hand-checked fixtures.
pub fn small_params() -> MadParams {
    MadParams {
        short_period: 3,
        long_period: 10,
        ..MadParams::default()
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 15),
        end_date: date(2024, 3, 31),
        initial_capital: 100_000.0,
        fee_rate: 0.001,
        risk_free_rate: 0.0,
        mad: small_params(),
        universe: UniverseParams::default(),
    }
}

/// Three NYS listings over 2024-01-01..=2024-03-31:
/// - `UP` steps 20 -> 30 on Jan 30 (long at the Feb rebalance)
/// - `DOWN` steps 20 -> 12 on Jan 30 (short at the Feb rebalance)
/// - `FLAT` stays at 50
///
/// All are flat again by the March rebalance.
pub fn sample_port() -> MockDataPort {
    let start = date(2024, 1, 1);
    let end = date(2024, 3, 31);
    let switch = date(2024, 1, 30);
    MockDataPort::new()
        .with_bars("UP", step_series("UP", "NYS", start, end, 20.0, 30.0, switch, 3_000_000))
        .with_bars("DOWN", step_series("DOWN", "NYS", start, end, 20.0, 12.0, switch, 2_000_000))
        .with_bars("FLAT", step_series("FLAT", "NAS", start, end, 50.0, 50.0, switch, 1_000_000))
}
