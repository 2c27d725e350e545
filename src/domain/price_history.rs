//! Per-symbol rolling price windows.
//!
//! `PriceHistory` is the explicit map entity that replaces shared
//! symbol-keyed state: the caller owns it and passes it to selection.

use std::collections::{HashMap, HashSet};

use super::rolling_window::{RollingWindow, WindowError};

#[derive(Debug, Clone)]
pub struct PriceHistory {
    empty: RollingWindow,
    windows: HashMap<String, RollingWindow>,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        Ok(Self {
            empty: RollingWindow::new(capacity)?,
            windows: HashMap::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.empty.capacity()
    }

    /// Append the newest close for `symbol`, creating its window on first sight.
    pub fn update(&mut self, symbol: &str, price: f64) {
        match self.windows.get_mut(symbol) {
            Some(window) => window.update(price),
            None => {
                let mut window = self.empty.clone();
                window.update(price);
                self.windows.insert(symbol.to_string(), window);
            }
        }
    }

    /// Seed `symbol` from historical closes ordered oldest first.
    ///
    /// Any previous window for the symbol is replaced.
    pub fn warm_up(&mut self, symbol: &str, closes: &[f64]) {
        self.windows.remove(symbol);
        for &close in closes {
            self.update(symbol, close);
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.windows.contains_key(symbol)
    }

    pub fn is_ready(&self, symbol: &str) -> bool {
        self.windows.get(symbol).is_some_and(RollingWindow::is_ready)
    }

    pub fn observations(&self, symbol: &str) -> usize {
        self.windows.get(symbol).map_or(0, RollingWindow::len)
    }

    /// Newest-first prices for `symbol`.
    pub fn prices(&self, symbol: &str) -> Option<Vec<f64>> {
        self.windows.get(symbol).map(RollingWindow::snapshot)
    }

    /// Symbols whose window is full, sorted.
    pub fn ready_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, w)| w.is_ready())
            .map(|(s, _)| s.clone())
            .collect();
        symbols.sort();
        symbols
    }

    /// Drop windows for symbols outside `keep`.
    pub fn retain(&mut self, keep: &HashSet<String>) {
        self.windows.retain(|symbol, _| keep.contains(symbol));
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
