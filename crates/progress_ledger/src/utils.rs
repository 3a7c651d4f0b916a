//! Day-key and week-start helpers plus the clock they read "today" from.

use chrono::{Datelike, NaiveDate, TimeDelta};
use std::sync::Mutex;

use crate::LedgerError;

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of the current local calendar day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reads the local wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + TimeDelta::days(days);
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Format a date as its canonical `YYYY-MM-DD` day key.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` day key. Anything else, including a time component
/// or unpadded fields, is rejected.
pub fn parse_day_key(s: &str) -> Result<NaiveDate, LedgerError> {
    let trimmed = s.trim();
    if trimmed.len() != 10 {
        return Err(LedgerError::InvalidDayKey(s.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT)
        .map_err(|_| LedgerError::InvalidDayKey(s.to_string()))
}

pub fn today_key(clock: &dyn Clock) -> NaiveDate {
    clock.today()
}

/// Monday on or before `date`.
pub fn period_start(date: NaiveDate) -> NaiveDate {
    // Sunday = 0 .. Saturday = 6
    let weekday = date.weekday().num_days_from_sunday() as i64;
    let offset = if weekday == 0 { -6 } else { 1 - weekday };
    date + TimeDelta::days(offset)
}

pub fn period_start_key(clock: &dyn Clock) -> NaiveDate {
    period_start(clock.today())
}

/// The seven consecutive days of the period beginning at `start`.
pub fn period_day_keys(start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| start + TimeDelta::days(i as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_start_on_monday_is_same_day() {
        assert_eq!(period_start(date(2024, 1, 1)), date(2024, 1, 1));
    }

    #[test]
    fn period_start_on_sunday_goes_back_six_days() {
        assert_eq!(period_start(date(2024, 1, 7)), date(2024, 1, 1));
    }

    #[test]
    fn period_start_midweek() {
        assert_eq!(period_start(date(2024, 1, 4)), date(2024, 1, 1));
        assert_eq!(period_start(date(2024, 1, 6)), date(2024, 1, 1));
        assert_eq!(period_start(date(2024, 1, 8)), date(2024, 1, 8));
    }

    #[test]
    fn period_start_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday.
        assert_eq!(period_start(date(2025, 1, 1)), date(2024, 12, 30));
    }

    #[test]
    fn period_day_keys_are_consecutive() {
        let keys = period_day_keys(date(2024, 1, 1));
        let formatted: Vec<String> = keys.iter().map(|d| day_key(*d)).collect();
        assert_eq!(
            formatted,
            vec![
                "2024-01-01",
                "2024-01-02",
                "2024-01-03",
                "2024-01-04",
                "2024-01-05",
                "2024-01-06",
                "2024-01-07"
            ]
        );
    }

    #[test]
    fn parse_day_key_accepts_iso_days_only() {
        assert_eq!(parse_day_key("2024-01-02").unwrap(), date(2024, 1, 2));
        assert!(parse_day_key("2024-1-2").is_err());
        assert!(parse_day_key("2024-01-02T10:00:00").is_err());
        assert!(parse_day_key("2024-02-30").is_err());
        assert!(parse_day_key("yesterday").is_err());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(date(2024, 1, 7));
        assert_eq!(period_start_key(&clock), date(2024, 1, 1));
        clock.advance_days(1);
        assert_eq!(today_key(&clock), date(2024, 1, 8));
        assert_eq!(period_start_key(&clock), date(2024, 1, 8));
    }
}
