//! Universe construction and the coarse/fine screens.
//!
//! Listings are discovered through the data port, optionally restricted to
//! an explicit code list, and validated for enough history. On each
//! rebalance the coarse screen keeps liquid, priced-above-floor symbols with
//! a full rolling window; the fine screen keeps the allowed exchanges.

use crate::domain::error::MadError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_history::PriceHistory;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

pub const DEFAULT_EXCHANGES: [&str; 3] = ["NYS", "NAS", "ASE"];
pub const DEFAULT_MIN_PRICE: f64 = 5.0;
pub const DEFAULT_COARSE_COUNT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Listing {
    pub code: String,
    pub exchange: String,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub listings: Vec<Listing>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.listings.len()
    }

    pub fn codes(&self) -> Vec<String> {
        self.listings.iter().map(|l| l.code.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseParams {
    pub exchanges: Vec<String>,
    pub min_price: f64,
    pub coarse_count: usize,
}

impl Default for UniverseParams {
    fn default() -> Self {
        UniverseParams {
            exchanges: DEFAULT_EXCHANGES.iter().map(|e| e.to_string()).collect(),
            min_price: DEFAULT_MIN_PRICE,
            coarse_count: DEFAULT_COARSE_COUNT,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Liquidity and price screen over the day's bars.
///
/// Keeps bars priced above `min_price` whose symbol has a full window, ranked
/// by dollar volume descending and capped at `coarse_count`.
pub fn coarse_filter<'a>(
    bars: &[&'a OhlcvBar],
    history: &PriceHistory,
    params: &UniverseParams,
) -> Vec<&'a OhlcvBar> {
    let mut liquid: Vec<&OhlcvBar> = bars
        .iter()
        .copied()
        .filter(|bar| bar.close > params.min_price)
        .collect();

    liquid.sort_by(|a, b| {
        b.dollar_volume()
            .total_cmp(&a.dollar_volume())
            .then_with(|| a.code.cmp(&b.code))
    });

    liquid
        .into_iter()
        .filter(|bar| history.is_ready(&bar.code))
        .take(params.coarse_count)
        .collect()
}

/// Exchange screen.
pub fn fine_filter<'a>(bars: &[&'a OhlcvBar], params: &UniverseParams) -> Vec<&'a OhlcvBar> {
    bars.iter()
        .copied()
        .filter(|bar| params.exchanges.iter().any(|e| *e == bar.exchange))
        .collect()
}

/// List the symbols available on each allowed exchange, optionally
/// restricted to `codes`.
pub fn discover_listings(
    data_port: &dyn DataPort,
    exchanges: &[String],
    codes: Option<&[String]>,
) -> Result<Vec<Listing>, MadError> {
    let wanted: Option<HashSet<&str>> = codes.map(|c| c.iter().map(String::as_str).collect());
    let mut listings = Vec::new();

    for exchange in exchanges {
        for code in data_port.list_symbols(exchange)? {
            if wanted.as_ref().is_none_or(|w| w.contains(code.as_str())) {
                listings.push(Listing {
                    code,
                    exchange: exchange.clone(),
                });
            }
        }
    }

    if let Some(codes) = codes {
        for code in codes {
            if !listings.iter().any(|l| &l.code == code) {
                warn!(%code, "code not listed on any configured exchange");
            }
        }
    }

    listings.sort();
    Ok(listings)
}

#[derive(Debug)]
pub struct UniverseValidationResult {
    pub universe: Universe,
    pub skipped: Vec<SkippedCode>,
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

/// Drop listings that can never fill a `min_bars` window over the range.
pub fn validate_universe(
    data_port: &dyn DataPort,
    listings: Vec<Listing>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<UniverseValidationResult, MadError> {
    let total = listings.len();
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for listing in listings {
        let ohlcv = match data_port.fetch_ohlcv(&listing.code, &listing.exchange, start_date, end_date)
        {
            Ok(data) => data,
            Err(e) => {
                warn!(code = %listing.code, exchange = %listing.exchange, error = %e, "skipping listing");
                skipped.push(SkippedCode {
                    code: listing.code,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if ohlcv.is_empty() {
            warn!(code = %listing.code, exchange = %listing.exchange, "skipping listing: no data found");
            skipped.push(SkippedCode {
                code: listing.code,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if ohlcv.len() < min_bars {
            warn!(
                code = %listing.code,
                exchange = %listing.exchange,
                bars = ohlcv.len(),
                minimum = min_bars,
                "skipping listing: not enough history"
            );
            skipped.push(SkippedCode {
                code: listing.code,
                reason: SkipReason::InsufficientBars { bars: ohlcv.len() },
            });
            continue;
        }

        valid.push(listing);
    }

    if valid.is_empty() {
        return Err(MadError::InsufficientData {
            code: "all".to_string(),
            exchange: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    info!(valid = valid.len(), total, "universe validated");

    Ok(UniverseValidationResult {
        universe: Universe { listings: valid },
        skipped,
    })
}
