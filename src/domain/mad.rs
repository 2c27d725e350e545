//! Moving Average Distance ratio and long/short classification.
//!
//! MAD = MA(short) / MA(long), both taken over the newest closes of a
//! symbol's rolling window. Symbols at or above `long_threshold` go long,
//! symbols at or below `short_threshold` go short, everything else is
//! left out of the portfolio.

use std::collections::BTreeMap;

use super::price_history::PriceHistory;

pub const DEFAULT_SHORT_PERIOD: usize = 21;
pub const DEFAULT_LONG_PERIOD: usize = 200;
pub const DEFAULT_LONG_THRESHOLD: f64 = 1.2;
pub const DEFAULT_SHORT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct MadParams {
    pub short_period: usize,
    pub long_period: usize,
    pub long_threshold: f64,
    pub short_threshold: f64,
}

impl Default for MadParams {
    fn default() -> Self {
        MadParams {
            short_period: DEFAULT_SHORT_PERIOD,
            long_period: DEFAULT_LONG_PERIOD,
            long_threshold: DEFAULT_LONG_THRESHOLD,
            short_threshold: DEFAULT_SHORT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("moving average periods must be positive")]
    ZeroPeriod,

    #[error("short period {short} exceeds long period {long}")]
    ShortExceedsLong { short: usize, long: usize },

    #[error("short threshold {short} must be below long threshold {long}")]
    ThresholdsOverlap { short: f64, long: f64 },
}

impl ParamsError {
    /// `[strategy]` config key the error refers to.
    pub fn key(&self) -> &'static str {
        match self {
            ParamsError::ZeroPeriod | ParamsError::ShortExceedsLong { .. } => "short_period",
            ParamsError::ThresholdsOverlap { .. } => "short_threshold",
        }
    }
}

impl MadParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.short_period == 0 || self.long_period == 0 {
            return Err(ParamsError::ZeroPeriod);
        }
        if self.short_period > self.long_period {
            return Err(ParamsError::ShortExceedsLong {
                short: self.short_period,
                long: self.long_period,
            });
        }
        // NaN thresholds fail this comparison too.
        if !(self.short_threshold < self.long_threshold) {
            return Err(ParamsError::ThresholdsOverlap {
                short: self.short_threshold,
                long: self.long_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MadReading {
    pub ma_short: f64,
    pub ma_long: f64,
    pub mad: f64,
}

/// Why a symbol produced no MAD reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MadSkip {
    InsufficientHistory { have: usize, need: usize },
    ZeroLongAverage,
    NonFinite,
}

/// Mean of the first `period` prices, `None` if fewer are available.
pub fn moving_average(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    Some(prices[..period].iter().sum::<f64>() / period as f64)
}

/// Compute MAD from newest-first prices.
pub fn compute_mad(prices: &[f64], params: &MadParams) -> Result<MadReading, MadSkip> {
    let need = params.long_period.max(params.short_period);
    let insufficient = MadSkip::InsufficientHistory {
        have: prices.len(),
        need,
    };
    let ma_short = moving_average(prices, params.short_period).ok_or(insufficient)?;
    let ma_long = moving_average(prices, params.long_period).ok_or(insufficient)?;

    if ma_long == 0.0 {
        return Err(MadSkip::ZeroLongAverage);
    }
    let mad = ma_short / ma_long;
    if !mad.is_finite() {
        return Err(MadSkip::NonFinite);
    }

    Ok(MadReading {
        ma_short,
        ma_long,
        mad,
    })
}

pub fn classify(mad: f64, params: &MadParams) -> Option<Side> {
    if mad >= params.long_threshold {
        Some(Side::Long)
    } else if mad <= params.short_threshold {
        Some(Side::Short)
    } else {
        None
    }
}

/// Outcome of one ranking pass. `long` and `short` are disjoint and sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub long: Vec<String>,
    pub short: Vec<String>,
    pub readings: BTreeMap<String, MadReading>,
    pub skipped: Vec<(String, MadSkip)>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }

    pub fn side_of(&self, symbol: &str) -> Option<Side> {
        if self.long.iter().any(|s| s == symbol) {
            Some(Side::Long)
        } else if self.short.iter().any(|s| s == symbol) {
            Some(Side::Short)
        } else {
            None
        }
    }

    /// Keep only symbols accepted by `tradable`, on both sides.
    pub fn retain_tradable<F>(&mut self, mut tradable: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.long.retain(|s| tradable(s));
        self.short.retain(|s| tradable(s));
    }
}

/// Rank `candidates` by MAD using the windows in `history`.
pub fn select<S: AsRef<str>>(
    history: &PriceHistory,
    candidates: &[S],
    params: &MadParams,
) -> Selection {
    let mut selection = Selection::default();

    for candidate in candidates {
        let symbol = candidate.as_ref();
        if selection.readings.contains_key(symbol) {
            continue;
        }
        let prices = history.prices(symbol).unwrap_or_default();
        let reading = match compute_mad(&prices, params) {
            Ok(r) => r,
            Err(skip) => {
                selection.skipped.push((symbol.to_string(), skip));
                continue;
            }
        };

        match classify(reading.mad, params) {
            Some(Side::Long) => selection.long.push(symbol.to_string()),
            Some(Side::Short) => selection.short.push(symbol.to_string()),
            None => {}
        }
        selection.readings.insert(symbol.to_string(), reading);
    }

    selection.long.sort();
    selection.short.sort();
    selection
}
