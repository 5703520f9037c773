use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Values at or above this magnitude are microsecond stamps.
///
/// The service switched some futures archives from millisecond to
/// microsecond precision; both appear in the wild for the same category.
const MICROSECOND_THRESHOLD: i64 = 1_000_000_000_000_000;

const DATETIME_TEXT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// How a category encodes its record timestamp on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampEncoding {
    /// Integer epoch milliseconds (microseconds are normalized down).
    EpochMillis,
    /// Naive `YYYY-MM-DD HH:MM:SS` text, implicitly UTC.
    DateTimeText,
}

/// Record timestamp as UTC epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Parse one CSV field according to the category's encoding.
    ///
    /// Returns `None` when the field does not carry a timestamp in that
    /// encoding; the decoder turns that into a schema mismatch.
    pub fn parse_field(field: &str, encoding: TimestampEncoding) -> Option<Self> {
        match encoding {
            TimestampEncoding::EpochMillis => {
                let raw: i64 = field.trim().parse().ok()?;
                if raw.abs() >= MICROSECOND_THRESHOLD {
                    Some(Self(raw / 1_000))
                } else {
                    Some(Self(raw))
                }
            }
            TimestampEncoding::DateTimeText => {
                let parsed = PrimitiveDateTime::parse(field.trim(), DATETIME_TEXT).ok()?;
                let nanos = parsed.assume_utc().unix_timestamp_nanos();
                Some(Self((nanos / 1_000_000) as i64))
            }
        }
    }

    /// Render as RFC 3339 UTC, falling back to the raw millisecond count
    /// for values outside the representable calendar range.
    pub fn to_rfc3339(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            Ok(datetime) => datetime
                .format(&Rfc3339)
                .unwrap_or_else(|_| self.0.to_string()),
            Err(_) => self.0.to_string(),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_milliseconds() {
        let ts = Timestamp::parse_field("1672531200000", TimestampEncoding::EpochMillis)
            .expect("must parse");
        assert_eq!(ts.as_millis(), 1_672_531_200_000);
        assert_eq!(ts.to_rfc3339(), "2023-01-01T00:00:00Z");
    }

    #[test]
    fn normalizes_microsecond_stamps() {
        let ts = Timestamp::parse_field("1672531200000000", TimestampEncoding::EpochMillis)
            .expect("must parse");
        assert_eq!(ts.as_millis(), 1_672_531_200_000);
    }

    #[test]
    fn parses_naive_datetime_text() {
        let ts = Timestamp::parse_field("2023-01-01 00:05:00", TimestampEncoding::DateTimeText)
            .expect("must parse");
        assert_eq!(ts.as_millis(), 1_672_531_500_000);
    }

    #[test]
    fn rejects_field_in_wrong_encoding() {
        assert!(Timestamp::parse_field("open_time", TimestampEncoding::EpochMillis).is_none());
        assert!(Timestamp::parse_field("42.5", TimestampEncoding::EpochMillis).is_none());
        assert!(Timestamp::parse_field("1672531200000", TimestampEncoding::DateTimeText).is_none());
    }

    #[test]
    fn ordering_follows_millisecond_value() {
        let earlier = Timestamp::from_millis(1_000);
        let later = Timestamp::from_millis(2_000);
        assert!(earlier < later);
    }
}
