//! Rebalance driver and backtest event loop.
//!
//! Walks the unified timeline once. Every day the held weights are marked to
//! market and the day's closes are pushed into the rolling windows; on the
//! first trading day of each month the universe is screened, ranked by MAD,
//! sized equal-weight and handed to the weight sink.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::domain::code_data::CodeData;
use crate::domain::error::MadError;
use crate::domain::mad::{select, MadParams, MadReading};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::portfolio::Portfolio;
use crate::domain::price_history::PriceHistory;
use crate::domain::schedule::is_month_start;
use crate::domain::sizing::{equal_weights, TargetWeights};
use crate::domain::universe::{coarse_filter, fine_filter, UniverseParams};
use crate::ports::weight_sink::WeightSink;

pub const DEFAULT_FEE_RATE: f64 = 0.00005;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub risk_free_rate: f64,
    pub mad: MadParams,
    pub universe: UniverseParams,
}

impl BacktestConfig {
    /// First date to load so the long window is full by `start_date`.
    ///
    /// Converts trading days to calendar days (5 per 7) with two weeks of
    /// slack for holidays.
    pub fn warmup_start(&self) -> NaiveDate {
        let trading_days = self.mad.long_period as i64;
        let calendar_days = trading_days * 7 / 5 + 14;
        self.start_date - Duration::days(calendar_days)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub candidates: usize,
    pub long: Vec<String>,
    pub short: Vec<String>,
    pub turnover: f64,
    pub fee: f64,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub rebalances: Vec<RebalanceRecord>,
}

pub fn run_backtest(
    code_data: &[CodeData],
    timeline: &[NaiveDate],
    config: &BacktestConfig,
    sink: &mut dyn WeightSink,
) -> Result<BacktestResult, MadError> {
    config.mad.validate().map_err(|e| MadError::ConfigInvalid {
        section: "strategy".into(),
        key: e.key().into(),
        reason: e.to_string(),
    })?;
    let mut history =
        PriceHistory::new(config.mad.long_period).map_err(|e| MadError::ConfigInvalid {
            section: "strategy".into(),
            key: "long_period".into(),
            reason: e.to_string(),
        })?;

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut rebalances = Vec::new();
    let mut last_close: HashMap<String, f64> = HashMap::new();
    let mut previous_date: Option<NaiveDate> = None;

    for &date in timeline {
        if date > config.end_date {
            break;
        }
        let in_range = date >= config.start_date;

        let bars_today: Vec<&OhlcvBar> = code_data
            .iter()
            .filter_map(|cd| cd.get_bar(date))
            .collect();

        if in_range {
            let returns = daily_returns(&bars_today, &last_close);
            portfolio.mark_to_market(&returns);
        }

        for bar in &bars_today {
            history.update(&bar.code, bar.close);
            if bar.is_tradable() {
                last_close.insert(bar.code.clone(), bar.close);
            }
        }

        // A timeline that opens mid-month has no confirmed month start.
        let month_start = previous_date.is_some() && is_month_start(date, previous_date);
        if in_range && month_start {
            let record = rebalance(date, &bars_today, &history, config, &mut portfolio, sink)?;
            rebalances.push(record);
        }

        if in_range {
            portfolio.record_equity(date);
        }
        previous_date = Some(date);
    }

    sink.finish()?;

    Ok(BacktestResult {
        portfolio,
        rebalances,
    })
}

fn daily_returns(bars: &[&OhlcvBar], last_close: &HashMap<String, f64>) -> HashMap<String, f64> {
    bars.iter()
        .filter(|bar| bar.is_tradable())
        .filter_map(|bar| {
            let prev = *last_close.get(&bar.code)?;
            Some((bar.code.clone(), bar.close / prev - 1.0))
        })
        .collect()
}

/// One ranking pass: screened candidates, their MAD readings and the
/// resulting targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub candidates: Vec<String>,
    pub readings: BTreeMap<String, MadReading>,
    pub targets: TargetWeights,
}

/// Rank the day's universe and compute equal-weight targets.
///
/// Symbols without a tradable bar in `bars_today` get no allocation.
pub fn compute_targets(
    bars_today: &[&OhlcvBar],
    history: &PriceHistory,
    config: &BacktestConfig,
) -> Ranking {
    let coarse = coarse_filter(bars_today, history, &config.universe);
    let fine = fine_filter(&coarse, &config.universe);
    let candidates: Vec<&str> = fine.iter().map(|bar| bar.code.as_str()).collect();

    let mut selection = select(history, &candidates, &config.mad);
    for (symbol, skip) in &selection.skipped {
        debug!(%symbol, ?skip, "excluded from ranking");
    }

    let tradable: HashSet<&str> = bars_today
        .iter()
        .filter(|bar| bar.is_tradable())
        .map(|bar| bar.code.as_str())
        .collect();
    selection.retain_tradable(|symbol| tradable.contains(symbol));

    let targets = equal_weights(&selection);
    Ranking {
        candidates: candidates.into_iter().map(str::to_string).collect(),
        readings: selection.readings,
        targets,
    }
}

fn rebalance(
    date: NaiveDate,
    bars_today: &[&OhlcvBar],
    history: &PriceHistory,
    config: &BacktestConfig,
    portfolio: &mut Portfolio,
    sink: &mut dyn WeightSink,
) -> Result<RebalanceRecord, MadError> {
    let ranking = compute_targets(bars_today, history, config);
    let candidates = ranking.candidates.len();
    let targets = ranking.targets;

    sink.submit(date, &targets)?;

    let long: Vec<String> = targets
        .iter()
        .filter(|(_, w)| *w > 0.0)
        .map(|(s, _)| s.to_string())
        .collect();
    let short: Vec<String> = targets
        .iter()
        .filter(|(_, w)| *w < 0.0)
        .map(|(s, _)| s.to_string())
        .collect();

    let turnover = portfolio.rebalance(targets);
    let fee = config.fee_rate * turnover * portfolio.equity;
    portfolio.charge_fee(fee);

    info!(
        %date,
        candidates,
        long = long.len(),
        short = short.len(),
        turnover,
        equity = portfolio.equity,
        "rebalanced"
    );

    Ok(RebalanceRecord {
        date,
        candidates,
        long,
        short,
        turnover,
        fee,
        equity: portfolio.equity,
    })
}
