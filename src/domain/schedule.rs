//! Monthly rebalance schedule over a trading timeline.

use chrono::{Datelike, NaiveDate};

/// First trading date of each calendar month in an ascending timeline.
pub fn month_starts(timeline: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut starts = Vec::new();
    let mut last_month: Option<(i32, u32)> = None;

    for &date in timeline {
        let month = (date.year(), date.month());
        if last_month != Some(month) {
            starts.push(date);
            last_month = Some(month);
        }
    }

    starts
}

/// Whether `date` opens a new month relative to the previous trading date.
pub fn is_month_start(date: NaiveDate, previous: Option<NaiveDate>) -> bool {
    match previous {
        None => true,
        Some(prev) => (prev.year(), prev.month()) != (date.year(), date.month()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_starts_picks_first_trading_day() {
        let timeline = vec![
            d(2024, 1, 30),
            d(2024, 1, 31),
            d(2024, 2, 1),
            d(2024, 2, 2),
            d(2024, 3, 4),
            d(2024, 3, 5),
        ];
        assert_eq!(
            month_starts(&timeline),
            vec![d(2024, 1, 30), d(2024, 2, 1), d(2024, 3, 4)]
        );
    }

    #[test]
    fn same_month_different_year_is_new_start() {
        let timeline = vec![d(2023, 1, 3), d(2024, 1, 2)];
        assert_eq!(month_starts(&timeline), timeline);
    }

    #[test]
    fn empty_timeline() {
        assert!(month_starts(&[]).is_empty());
    }

    #[test]
    fn is_month_start_against_previous() {
        assert!(is_month_start(d(2024, 1, 2), None));
        assert!(is_month_start(d(2024, 2, 1), Some(d(2024, 1, 31))));
        assert!(!is_month_start(d(2024, 2, 2), Some(d(2024, 2, 1))));
    }
}
