use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

use crate::ValidationError;

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: input.trim().to_owned(),
    })
}

/// Zero-padded `YYYY-MM-DD` label for a calendar date.
pub fn date_label(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// The most recent UTC day whose archive the service can have published.
///
/// Archives appear only after the UTC day closes, so this is always
/// yesterday in UTC.
pub fn last_closed_utc_day() -> Date {
    let today = OffsetDateTime::now_utc().date();
    today.previous_day().unwrap_or(today)
}

/// Publishing cadence of a data category.
///
/// Decides the Range Expander's step size: one archive per calendar day or
/// one per calendar month intersecting the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    /// Path segment the service uses for this cadence.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive UTC calendar-day range. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange {
                start: date_label(start),
                end: date_label(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings and validate their order.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    /// Number of calendar days covered, inclusive of both bounds.
    pub fn day_count(&self) -> usize {
        ((self.end - self.start).whole_days() + 1) as usize
    }

    /// Number of calendar months intersecting the range.
    pub fn month_count(&self) -> usize {
        let years = self.end.year() - self.start.year();
        let months =
            i32::from(u8::from(self.end.month())) - i32::from(u8::from(self.start.month()));
        (years * 12 + months + 1) as usize
    }

    /// Pull `end` back to `latest` when the range reaches past it.
    ///
    /// Returns `None` when even `start` lies after `latest`, meaning the
    /// range asks only for days the service cannot have published yet.
    pub fn clamp_end_to(&self, latest: Date) -> Option<Self> {
        if self.start > latest {
            return None;
        }
        Some(Self {
            start: self.start,
            end: self.end.min(latest),
        })
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", date_label(self.start), date_label(self.end))
    }
}

/// The calendar unit one archive covers: a single day or a whole month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArchivePeriod {
    Day(Date),
    /// Stored as the first day of the month.
    Month(Date),
}

impl ArchivePeriod {
    pub const fn day(date: Date) -> Self {
        Self::Day(date)
    }

    pub fn month(date: Date) -> Self {
        Self::Month(date.replace_day(1).unwrap_or(date))
    }

    /// Label used in remote paths and error reports: `YYYY-MM-DD` for daily
    /// archives, `YYYY-MM` for monthly bundles.
    pub fn label(&self) -> String {
        match self {
            Self::Day(date) => date_label(*date),
            Self::Month(date) => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
        }
    }

    /// First calendar day the period covers.
    pub const fn first_date(&self) -> Date {
        match self {
            Self::Day(date) | Self::Month(date) => *date,
        }
    }

    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Day(_) => Granularity::Daily,
            Self::Month(_) => Granularity::Monthly,
        }
    }
}

impl Display for ArchivePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for ArchivePeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.label())
    }
}

/// First day of the month after the one containing `date`.
pub(crate) fn first_of_next_month(date: Date) -> Option<Date> {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        other => (date.year(), other.next()),
    };
    Date::from_calendar_date(year, month, 1).ok()
}
