//! calendar.rs: weekend / holiday / long-weekend classification of a stay.
//!
//! Pure date logic: depends only on the stay dates and the holiday set.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeError};
use crate::signals::Holiday;

/// Days either side of a Friday/Monday holiday that count as its long weekend.
const LONG_WEEKEND_REACH_DAYS: i64 = 2;

pub(crate) const REVERSED_STAY: &str = "check_out precedes check_in";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarContext {
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub is_long_weekend: bool,
    /// Not computed yet; always false.
    #[serde(default)]
    pub is_school_holiday: bool,
    /// Holidays falling inside the inclusive stay window.
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

impl CalendarContext {
    /// A context with no calendar effect at all.
    pub fn plain_weekday() -> Self {
        Self {
            is_weekend: false,
            is_holiday: false,
            is_long_weekend: false,
            is_school_holiday: false,
            holidays: Vec::new(),
        }
    }
}

/// Classify a stay. Fails if `check_out` precedes `check_in`.
pub fn analyze_calendar(
    check_in: NaiveDate,
    check_out: NaiveDate,
    holidays: &[Holiday],
) -> Result<CalendarContext> {
    if check_out < check_in {
        return Err(SurgeError::invalid("check_out", REVERSED_STAY));
    }

    let relevant = holidays
        .iter()
        .filter(|h| h.date >= check_in && h.date <= check_out)
        .cloned()
        .collect();

    Ok(CalendarContext {
        is_weekend: is_weekend(check_in),
        is_holiday: is_holiday(check_in, holidays),
        is_long_weekend: is_long_weekend(check_in, holidays),
        is_school_holiday: false,
        holidays: relevant,
    })
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_holiday(date: NaiveDate, holidays: &[Holiday]) -> bool {
    holidays.iter().any(|h| h.date == date)
}

/// True if some holiday lands on a Friday or Monday and `date` is within
/// two days of it (inclusive on both sides).
pub fn is_long_weekend(date: NaiveDate, holidays: &[Holiday]) -> bool {
    let reach = Duration::days(LONG_WEEKEND_REACH_DAYS);
    holidays.iter().any(|h| {
        matches!(h.date.weekday(), Weekday::Fri | Weekday::Mon)
            && date >= h.date - reach
            && date <= h.date + reach
    })
}
