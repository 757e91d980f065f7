//! Calendar-day arithmetic shared by the schedule builders.
//!
//! All durations are whole calendar days and every window is half-open:
//! `[start, finish)`.

use chrono::{Days, NaiveDate};

use crate::error::EngineError;

/// `date` moved by `offset` days (negative moves backwards).
pub fn shift_date(date: NaiveDate, offset: i64) -> Result<NaiveDate, EngineError> {
    let shifted = if offset >= 0 {
        date.checked_add_days(Days::new(offset as u64))
    } else {
        date.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    shifted.ok_or_else(|| EngineError::DateOutOfRange(format!("{} {:+} days", date, offset)))
}

/// Calendar days in `[start, finish)`.
pub fn days_between(start: NaiveDate, finish: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = (finish - start).num_days().max(0) as u64;
    (0..count).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
}
