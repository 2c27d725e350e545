//! Equal-weight position sizing.
//!
//! Each side of a selection is sized independently: every long gets
//! `+1 / count_long`, every short gets `-1 / count_short`. An empty side
//! receives no allocation.

use std::collections::BTreeMap;

use super::mad::{Selection, Side};

/// Target portfolio weights keyed by symbol. Longs positive, shorts negative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetWeights {
    weights: BTreeMap<String, f64>,
}

impl TargetWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, symbol: &str, weight: f64) {
        if weight == 0.0 {
            self.weights.remove(symbol);
        } else {
            self.weights.insert(symbol.to_string(), weight);
        }
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, &w)| (s.as_str(), w))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn side_count(&self, side: Side) -> usize {
        self.weights
            .values()
            .filter(|&&w| match side {
                Side::Long => w > 0.0,
                Side::Short => w < 0.0,
            })
            .count()
    }

    /// Sum of positive weights.
    pub fn long_exposure(&self) -> f64 {
        self.weights.values().filter(|&&w| w > 0.0).sum()
    }

    /// Sum of |negative weights|.
    pub fn short_exposure(&self) -> f64 {
        self.weights.values().filter(|&&w| w < 0.0).map(|w| w.abs()).sum()
    }

    pub fn gross_exposure(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }

    /// Sum of |self - other| over the union of both symbol sets.
    pub fn turnover(&self, other: &TargetWeights) -> f64 {
        let mut total: f64 = self
            .weights
            .iter()
            .map(|(s, &w)| (w - other.get(s)).abs())
            .sum();
        total += other
            .weights
            .iter()
            .filter(|(s, _)| !self.weights.contains_key(*s))
            .map(|(_, w)| w.abs())
            .sum::<f64>();
        total
    }
}

pub fn equal_weights(selection: &Selection) -> TargetWeights {
    let mut targets = TargetWeights::new();

    if !selection.long.is_empty() {
        let weight = 1.0 / selection.long.len() as f64;
        for symbol in &selection.long {
            targets.set(symbol, weight);
        }
    }

    if !selection.short.is_empty() {
        let weight = -1.0 / selection.short.len() as f64;
        for symbol in &selection.short {
            targets.set(symbol, weight);
        }
    }

    targets
}
