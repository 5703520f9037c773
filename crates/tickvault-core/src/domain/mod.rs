//! # Domain Models
//!
//! Calendar and record types for the download pipeline.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated exchange pair ticker |
//! | [`DateRange`] | Inclusive UTC calendar-day range |
//! | [`ArchivePeriod`] | Calendar unit one archive covers (day or month) |
//! | [`Granularity`] | Publishing cadence (daily / monthly) |
//! | [`Timestamp`] | Record timestamp as UTC epoch milliseconds |
//! | [`Row`] / [`RowSet`] | Parsed archive records |
//! | [`Dataset`] | Merged, timestamp-ordered output table |
//!
//! All construction paths validate their invariants; a `DateRange` with
//! `start > end` or a malformed symbol is unrepresentable.

mod date;
mod records;
mod symbol;
mod timestamp;

pub use date::{
    date_label, last_closed_utc_day, parse_date, ArchivePeriod, DateRange, Granularity,
};
pub(crate) use date::first_of_next_month;
pub use records::{Dataset, Row, RowSet};
pub use symbol::Symbol;
pub use timestamp::{Timestamp, TimestampEncoding};
