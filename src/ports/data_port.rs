//! Price data access port.

use crate::domain::error::MadError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for one listing within `[start_date, end_date]`, oldest first.
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MadError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, MadError>;

    /// First date, last date and bar count, or `None` when the listing has no bars.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MadError>;
}
