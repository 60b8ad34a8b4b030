use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// how the number of chargeable days is derived from a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountPolicy {
    /// whole days elapsed between the two dates, rounded up
    Elapsed,
    /// both the first and the last day are charged
    Inclusive,
}

/// what to do with a range whose end falls before its start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    /// measure the distance between the dates regardless of order
    Undirected,
    /// refuse to quote
    RejectInverted,
}

impl DayCountPolicy {
    /// chargeable days between two dates, never below `minimum_days`
    pub fn count_days(&self, start: NaiveDate, end: NaiveDate, minimum_days: u32) -> u32 {
        // calendar dates carry no time-of-day, so the ceil over elapsed days is exact
        let elapsed = (end - start).num_days().unsigned_abs();
        let days = match self {
            DayCountPolicy::Elapsed => elapsed,
            DayCountPolicy::Inclusive => elapsed + 1,
        };
        u32::try_from(days).unwrap_or(u32::MAX).max(minimum_days)
    }
}

/// parse a date field as typed by the user
///
/// Accepts `YYYY-MM-DD` (what a browser date input submits) and RFC 3339
/// timestamps, of which only the calendar date is kept. Blank or malformed
/// input gives `None`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
