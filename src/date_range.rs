//! Inclusive date ranges and lenient parsing of range query parameters.

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::calendar::month_bounds;

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    /// The calendar month containing `date`.
    pub fn month_of(date: Date) -> Self {
        let (start, end) = month_bounds(date);

        Self { start, end }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The query parameters for endpoints that report over a period.
///
/// Both dates are kept as raw strings so that malformed values can be
/// ignored instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    /// The first day of the period, formatted as YYYY-MM-DD.
    pub start: Option<String>,
    /// The last day of the period, formatted as YYYY-MM-DD.
    pub end: Option<String>,
}

impl DateRangeQuery {
    /// Resolve the query into a date range.
    ///
    /// Falls back to the month containing `today` if either date is missing or
    /// malformed, or if the start date is after the end date.
    pub fn resolve(&self, today: Date) -> DateRange {
        let start = self.start.as_deref().and_then(parse_date);
        let end = self.end.as_deref().and_then(parse_date);

        match (start, end) {
            (Some(start), Some(end)) if start <= end => DateRange { start, end },
            (None, None) => DateRange::month_of(today),
            _ => {
                tracing::debug!(
                    "Ignoring invalid date range query {self:?}, using the current month instead"
                );
                DateRange::month_of(today)
            }
        }
    }
}

/// Parse a date formatted as YYYY-MM-DD.
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}
