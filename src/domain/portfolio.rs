//! Weight-based paper portfolio and equity tracking.
//!
//! Holdings are weights of current equity rather than share counts. Each day
//! equity grows by the weighted close-to-close return of the held symbols and
//! the weights drift with relative performance until the next rebalance
//! replaces them wholesale.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::sizing::TargetWeights;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub equity: f64,
    pub initial_capital: f64,
    pub weights: TargetWeights,
    pub fees_paid: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            equity: initial_capital,
            initial_capital,
            weights: TargetWeights::new(),
            fees_paid: 0.0,
            equity_curve: Vec::new(),
        }
    }

    /// Apply one day of returns to the held positions.
    ///
    /// Symbols missing from `returns` are unchanged for the day. Each weight
    /// drifts to `w * (1 + r) / (1 + R)` where `R` is the portfolio return.
    /// Returns the portfolio's daily return.
    pub fn mark_to_market(&mut self, returns: &HashMap<String, f64>) -> f64 {
        let daily_return: f64 = self
            .weights
            .iter()
            .filter_map(|(symbol, weight)| returns.get(symbol).map(|r| weight * r))
            .sum();
        self.equity *= 1.0 + daily_return;

        let growth = 1.0 + daily_return;
        if growth > 0.0 {
            let drifted: Vec<(String, f64)> = self
                .weights
                .iter()
                .map(|(symbol, weight)| {
                    let r = returns.get(symbol).copied().unwrap_or(0.0);
                    (symbol.to_string(), weight * (1.0 + r) / growth)
                })
                .collect();
            for (symbol, weight) in drifted {
                self.weights.set(&symbol, weight);
            }
        }
        daily_return
    }

    /// Liquidate the held weights and take `targets`.
    ///
    /// Returns turnover against the drifted holdings.
    pub fn rebalance(&mut self, targets: TargetWeights) -> f64 {
        let turnover = targets.turnover(&self.weights);
        self.weights = targets;
        turnover
    }

    pub fn charge_fee(&mut self, amount: f64) {
        self.equity -= amount;
        self.fees_paid += amount;
    }

    pub fn record_equity(&mut self, date: NaiveDate) {
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.equity,
        });
    }

    pub fn position_count(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weights(pairs: &[(&str, f64)]) -> TargetWeights {
        let mut w = TargetWeights::new();
        for (s, v) in pairs {
            w.set(s, *v);
        }
        w
    }

    fn returns(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(s, r)| (s.to_string(), *r)).collect()
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100_000.0);
        assert_eq!(portfolio.equity, 100_000.0);
        assert_eq!(portfolio.initial_capital, 100_000.0);
        assert_eq!(portfolio.position_count(), 0);
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn mark_to_market_all_cash_is_flat() {
        let mut portfolio = Portfolio::new(100_000.0);
        let r = portfolio.mark_to_market(&returns(&[("A", 0.10)]));
        assert_eq!(r, 0.0);
        assert_eq!(portfolio.equity, 100_000.0);
    }

    #[test]
    fn mark_to_market_long_short() {
        let mut portfolio = Portfolio::new(100_000.0);
        portfolio.rebalance(weights(&[("A", 1.0), ("B", -1.0)]));
        // Long gains 10%, short's stock gains 5%: net +5%.
        let r = portfolio.mark_to_market(&returns(&[("A", 0.10), ("B", 0.05)]));
        assert_relative_eq!(r, 0.05, epsilon = 1e-12);
        assert_relative_eq!(portfolio.equity, 105_000.0, epsilon = 1e-6);
    }

    #[test]
    fn mark_to_market_ignores_missing_returns() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.rebalance(weights(&[("A", 0.5), ("B", 0.5)]));
        portfolio.mark_to_market(&returns(&[("A", 0.2)]));
        assert_relative_eq!(portfolio.equity, 1_100.0, epsilon = 1e-9);
    }

    #[test]
    fn held_weights_drift_with_prices() {
        let mut portfolio = Portfolio::new(1.0);
        portfolio.rebalance(weights(&[("A", 0.5), ("B", 0.5)]));

        portfolio.mark_to_market(&returns(&[("A", 1.0), ("B", 0.0)]));
        assert_relative_eq!(portfolio.equity, 1.5, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weights.get("A"), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weights.get("B"), 1.0 / 3.0, epsilon = 1e-12);

        portfolio.mark_to_market(&returns(&[("A", -0.5), ("B", 0.0)]));
        assert_relative_eq!(portfolio.equity, 1.0, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weights.get("A"), 0.5, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weights.get("B"), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn short_weight_drifts_with_stock() {
        let mut portfolio = Portfolio::new(100.0);
        portfolio.rebalance(weights(&[("A", 1.0), ("B", -1.0)]));
        // A +10%, B +5%: portfolio +5%.
        portfolio.mark_to_market(&returns(&[("A", 0.10), ("B", 0.05)]));
        assert_relative_eq!(portfolio.weights.get("A"), 1.10 / 1.05, epsilon = 1e-12);
        assert_relative_eq!(portfolio.weights.get("B"), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn turnover_measured_against_drifted_holdings() {
        let mut portfolio = Portfolio::new(1.0);
        portfolio.rebalance(weights(&[("A", 0.5), ("B", 0.5)]));
        portfolio.mark_to_market(&returns(&[("A", 1.0)]));
        // Drifted A 2/3, B 1/3 back to 0.5 / 0.5.
        let turnover = portfolio.rebalance(weights(&[("A", 0.5), ("B", 0.5)]));
        assert_relative_eq!(turnover, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rebalance_replaces_weights() {
        let mut portfolio = Portfolio::new(1_000.0);
        let first = portfolio.rebalance(weights(&[("A", 1.0)]));
        assert_relative_eq!(first, 1.0);
        let second = portfolio.rebalance(weights(&[("B", -1.0)]));
        assert_relative_eq!(second, 2.0);
        assert_eq!(portfolio.weights.get("A"), 0.0);
        assert_eq!(portfolio.weights.get("B"), -1.0);
    }

    #[test]
    fn charge_fee_reduces_equity() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.charge_fee(2.5);
        portfolio.charge_fee(0.5);
        assert_relative_eq!(portfolio.equity, 997.0);
        assert_relative_eq!(portfolio.fees_paid, 3.0);
    }

    #[test]
    fn record_equity() {
        let mut portfolio = Portfolio::new(100_000.0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        portfolio.record_equity(date);
        assert_eq!(portfolio.equity_curve.len(), 1);
        assert_eq!(portfolio.equity_curve[0].date, date);
        assert_eq!(portfolio.equity_curve[0].equity, 100_000.0);
    }
}
