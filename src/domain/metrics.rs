//! Performance metrics and rebalance statistics.

use super::backtest::{BacktestResult, RebalanceRecord};
use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub rebalance_count: usize,
    pub avg_long_count: f64,
    pub avg_short_count: f64,
    pub avg_turnover: f64,
    pub fees_paid: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let equity_curve = &result.portfolio.equity_curve;
        let initial_capital = result.portfolio.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let trading_days = equity_curve.len() as f64;
        let years = trading_days / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let (rebalance_count, avg_long_count, avg_short_count, avg_turnover) =
            compute_rebalance_stats(&result.rebalances);

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            rebalance_count,
            avg_long_count,
            avg_short_count,
            avg_turnover,
            fees_paid: result.portfolio.fees_paid,
        }
    }
}

fn compute_rebalance_stats(rebalances: &[RebalanceRecord]) -> (usize, f64, f64, f64) {
    let count = rebalances.len();
    if count == 0 {
        return (0, 0.0, 0.0, 0.0);
    }
    let n = count as f64;
    let longs = rebalances.iter().map(|r| r.long.len()).sum::<usize>() as f64;
    let shorts = rebalances.iter().map(|r| r.short.len()).sum::<usize>() as f64;
    let turnover: f64 = rebalances.iter().map(|r| r.turnover).sum();
    (count, longs / n, shorts / n, turnover / n)
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::Portfolio;
    use chrono::NaiveDate;

    fn make_result(values: &[f64], rebalances: Vec<RebalanceRecord>) -> BacktestResult {
        let initial = values.first().copied().unwrap_or(100_000.0);
        let mut portfolio = Portfolio::new(initial);
        for (i, &v) in values.iter().enumerate() {
            portfolio.equity = v;
            portfolio.record_equity(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            );
        }
        BacktestResult {
            portfolio,
            rebalances,
        }
    }

    fn make_rebalance(long: usize, short: usize, turnover: f64) -> RebalanceRecord {
        RebalanceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            candidates: long + short,
            long: (0..long).map(|i| format!("L{i}")).collect(),
            short: (0..short).map(|i| format!("S{i}")).collect(),
            turnover,
            fee: 0.0,
            equity: 100_000.0,
        }
    }

    #[test]
    fn metrics_empty_result() {
        let metrics = Metrics::compute(&make_result(&[], vec![]), 0.05);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.rebalance_count, 0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn metrics_total_return_positive() {
        let metrics = Metrics::compute(&make_result(&[100_000.0, 110_000.0], vec![]), 0.05);
        assert!((metrics.total_return - 0.10).abs() < 1e-9);
    }

    #[test]
    fn metrics_total_return_negative() {
        let metrics = Metrics::compute(&make_result(&[100_000.0, 90_000.0], vec![]), 0.05);
        assert!((metrics.total_return - (-0.10)).abs() < 1e-9);
    }

    #[test]
    fn metrics_flat_year_has_zero_annualized() {
        let values = vec![100_000.0; 252];
        let metrics = Metrics::compute(&make_result(&values, vec![]), 0.0);
        assert!(metrics.annualized_return.abs() < 1e-9);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn metrics_drawdown() {
        let values = [100.0, 120.0, 90.0, 96.0, 130.0];
        let metrics = Metrics::compute(&make_result(&values, vec![]), 0.0);
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-9);
        assert_eq!(metrics.max_drawdown_duration, 2);
    }

    #[test]
    fn metrics_sharpe_positive_for_rising_curve() {
        let values = [100.0, 101.0, 103.0, 102.5, 105.0];
        let metrics = Metrics::compute(&make_result(&values, vec![]), 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sortino_ratio > 0.0);
    }

    #[test]
    fn metrics_rebalance_stats() {
        let rebalances = vec![make_rebalance(2, 4, 2.0), make_rebalance(4, 0, 1.0)];
        let metrics = Metrics::compute(&make_result(&[100.0, 100.0], rebalances), 0.0);
        assert_eq!(metrics.rebalance_count, 2);
        assert!((metrics.avg_long_count - 3.0).abs() < f64::EPSILON);
        assert!((metrics.avg_short_count - 2.0).abs() < f64::EPSILON);
        assert!((metrics.avg_turnover - 1.5).abs() < f64::EPSILON);
    }
}
