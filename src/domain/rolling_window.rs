//! Fixed-capacity rolling buffer of daily closes.
//!
//! Prices are appended oldest to newest; once the buffer holds `capacity`
//! prices each update evicts the oldest one. Snapshots come back
//! newest-first so that `prices[..n]` is always the most recent `n` closes.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("rolling window capacity must be positive")]
    ZeroCapacity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    capacity: usize,
    prices: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            prices: VecDeque::with_capacity(capacity),
        })
    }

    pub fn update(&mut self, price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    pub fn is_ready(&self) -> bool {
        self.prices.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent price, if any.
    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    /// Prices newest-first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.prices.iter().rev().copied().collect()
    }

    pub fn clear(&mut self) {
        self.prices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(RollingWindow::new(0), Err(WindowError::ZeroCapacity));
    }

    #[test]
    fn not_ready_until_full() {
        let mut w = RollingWindow::new(3).unwrap();
        assert!(w.is_empty());
        w.update(1.0);
        w.update(2.0);
        assert!(!w.is_ready());
        assert_eq!(w.len(), 2);
        w.update(3.0);
        assert!(w.is_ready());
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut w = RollingWindow::new(3).unwrap();
        for p in [1.0, 2.0, 3.0, 4.0, 5.0] {
            w.update(p);
        }
        assert_eq!(w.len(), 3);
        assert!(w.is_ready());
        assert_eq!(w.snapshot(), vec![5.0, 4.0, 3.0]);
    }

    #[test]
    fn snapshot_is_newest_first() {
        let mut w = RollingWindow::new(5).unwrap();
        w.update(10.0);
        w.update(20.0);
        w.update(30.0);
        assert_eq!(w.snapshot(), vec![30.0, 20.0, 10.0]);
        assert_eq!(w.latest(), Some(30.0));
    }

    #[test]
    fn clear_resets_readiness() {
        let mut w = RollingWindow::new(2).unwrap();
        w.update(1.0);
        w.update(2.0);
        assert!(w.is_ready());
        w.clear();
        assert!(!w.is_ready());
        assert_eq!(w.latest(), None);
        assert_eq!(w.capacity(), 2);
    }
}
