//! Target weight sink port.

use crate::domain::error::MadError;
use crate::domain::sizing::TargetWeights;
use chrono::NaiveDate;

/// Receives the full target portfolio at every rebalance.
///
/// Each submission replaces the previous one: symbols absent from `weights`
/// are to be liquidated.
pub trait WeightSink {
    fn submit(&mut self, date: NaiveDate, weights: &TargetWeights) -> Result<(), MadError>;

    /// Flush any buffered output. Default: nothing to flush.
    fn finish(&mut self) -> Result<(), MadError> {
        Ok(())
    }
}

/// In-memory sink keeping every submission in order.
impl WeightSink for Vec<(NaiveDate, TargetWeights)> {
    fn submit(&mut self, date: NaiveDate, weights: &TargetWeights) -> Result<(), MadError> {
        self.push((date, weights.clone()));
        Ok(())
    }
}
