//! Calendar arithmetic with explicit month-end clamping.
//!
//! Statement closing days, payment due days and monthly recurrences are all
//! expressed as a day of the month between 1 and 31. Months shorter than the
//! requested day use their last day instead, e.g. day 31 in April is April 30
//! and day 30 in February 2025 is February 28.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::Error;

/// A day of the month between 1 and 31 (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// Create a day of the month.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDayOfMonth] if `day` is not between 1 and 31.
    pub fn new(day: u8) -> Result<Self, Error> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(Error::InvalidDayOfMonth(day))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// This day within `month` of `year`, clamped to the last day of the month.
    ///
    /// Returns `None` if `year` is outside the range of dates [Date] supports.
    pub fn in_month(&self, year: i32, month: Month) -> Option<Date> {
        clamped_date(year, month, self.0)
    }
}

impl Display for DayOfMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<u8> for DayOfMonth {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DayOfMonth::new(value)
    }
}

impl From<DayOfMonth> for u8 {
    fn from(value: DayOfMonth) -> Self {
        value.0
    }
}

impl ToSql for DayOfMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for DayOfMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let day = u8::column_result(value)?;

        DayOfMonth::new(day).map_err(|_| FromSqlError::OutOfRange(day.into()))
    }
}

/// The date for `day` in `month` of `year`, or the last day of the month when
/// the month has fewer than `day` days.
///
/// `day` values of zero are treated as the first of the month. Returns `None`
/// if `year` is outside the range of dates [Date] supports.
pub fn clamped_date(year: i32, month: Month, day: u8) -> Option<Date> {
    let day = day.clamp(1, last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

/// The year and month before the month that `date` falls in.
///
/// Returns `None` if that month is before the first month [Date] supports.
pub fn previous_month(date: Date) -> Option<(i32, Month)> {
    let (year, month) = match date.month() {
        Month::January => (date.year() - 1, Month::December),
        month => (date.year(), month.previous()),
    };

    clamped_date(year, month, 1).map(|_| (year, month))
}

/// The year and month after the month that `date` falls in.
///
/// Returns `None` if that month is after the last month [Date] supports.
pub fn next_month(date: Date) -> Option<(i32, Month)> {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };

    clamped_date(year, month, 1).map(|_| (year, month))
}

/// The first and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let last_day = last_day_of_month(date.year(), date.month());

    (
        date.replace_day(1).unwrap_or(date),
        date.replace_day(last_day).unwrap_or(date),
    )
}

/// The number of days in `month` of `year`.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
