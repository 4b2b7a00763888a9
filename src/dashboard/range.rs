//! Date-range helpers for the dashboard: the active range and the month quick-pick.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, de};
use time::{Date, Duration, Month};

/// The number of months before the current month offered by the month picker.
const MONTHS_BEFORE: i32 = 11;
/// The number of months after the current month offered by the month picker.
const MONTHS_AFTER: i32 = 6;

/// An inclusive date range where either bound may be open.
///
/// A missing bound means the range is unbounded on that side. `start <= end`
/// is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// The range from the first day of `today`'s month through `today`.
    pub fn month_to_date(today: Date) -> Self {
        Self {
            start: Some(today.replace_day(1).unwrap_or(today)),
            end: Some(today),
        }
    }

    /// Whether the start date falls after the end date.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }
}

/// A calendar month in a specific year, written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> Month {
        self.month
    }

    /// Whether `date` falls within this month.
    pub fn contains(self, date: Date) -> bool {
        Self::of(date) == self
    }

    /// The first day of the month.
    pub fn first_day(self) -> Date {
        // Day one exists in every month of every representable year.
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month, accounting for leap years.
    pub fn last_day(self) -> Date {
        let last_day = self.month.length(self.year);

        Date::from_calendar_date(self.year, self.month, last_day).unwrap_or(Date::MAX)
    }

    /// The month `offset` months after this one. Negative offsets go backwards
    /// and roll over year boundaries.
    pub fn add_months(self, offset: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + offset;
        let year = index.div_euclid(12);
        let month = month_from_number((index.rem_euclid(12) + 1) as u8);

        Self::new(year, month)
    }

    /// A short label such as "Mar 2024".
    pub fn label(self) -> String {
        format!("{} {}", month_abbrev(self.month), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

/// The error returned when a string is not a valid `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseYearMonthError(String);

impl fmt::Display for ParseYearMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not a month in the format YYYY-MM", self.0)
    }
}

impl std::error::Error for ParseYearMonthError {}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || ParseYearMonthError(text.to_owned());
        let (year, month) = text.split_once('-').ok_or_else(error)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(error());
        }

        let year: i32 = year.parse().map_err(|_| error())?;
        let month: u8 = month.parse().map_err(|_| error())?;
        let month = Month::try_from(month).map_err(|_| error())?;

        Ok(Self::new(year, month))
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// The range covering the whole calendar month of `anchor`.
pub fn month_range(anchor: Date) -> DateRange {
    let month = YearMonth::of(anchor);

    DateRange {
        start: Some(month.first_day()),
        end: Some(month.last_day()),
    }
}

/// The months offered by the quick-pick, from eleven months before the month
/// of `today` through six months after it.
///
/// Each entry is the first day of the month.
pub fn month_picker_anchors(today: Date) -> Vec<Date> {
    let current = YearMonth::of(today);

    (-MONTHS_BEFORE..=MONTHS_AFTER)
        .map(|offset| current.add_months(offset).first_day())
        .collect()
}

/// Whether the quick-pick `anchor` should be highlighted for `range`.
///
/// Only the start of the range is considered.
pub fn is_active_month(anchor: Date, range: DateRange) -> bool {
    range
        .start
        .is_some_and(|start| YearMonth::of(start) == YearMonth::of(anchor))
}

/// The number of whole days between the two dates, ignoring order.
pub fn days_between(a: Date, b: Date) -> i64 {
    let span: Duration = b - a;

    span.whole_days().abs()
}

/// Format a date as `DD/MM/YYYY`.
pub fn format_day(date: Date) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month() as u8, date.year())
}

fn month_from_number(month: u8) -> Month {
    Month::try_from(month).unwrap_or(Month::January)
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
