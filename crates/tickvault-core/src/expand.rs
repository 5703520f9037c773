//! Range expansion: a date range becomes the ordered sequence of archives
//! to fetch.
//!
//! Expansion is lazy and restartable; iterating twice over the same range
//! yields the same sequence, and nothing here touches the network.

use time::Date;

use crate::category::CategoryDescriptor;
use crate::domain::{first_of_next_month, ArchivePeriod, DateRange, Granularity, Symbol};
use crate::resolver::{FileIdentifier, PathResolver};

/// Lazy iterator over the periods of a range, stepping by day or by month.
#[derive(Debug, Clone)]
pub struct PeriodIter {
    granularity: Granularity,
    cursor: Option<Date>,
    end: Date,
}

impl Iterator for PeriodIter {
    type Item = ArchivePeriod;

    fn next(&mut self) -> Option<ArchivePeriod> {
        let current = self.cursor?;
        if current > self.end {
            self.cursor = None;
            return None;
        }

        let (period, next) = match self.granularity {
            Granularity::Daily => (ArchivePeriod::day(current), current.next_day()),
            Granularity::Monthly => (ArchivePeriod::month(current), first_of_next_month(current)),
        };
        self.cursor = next;
        Some(period)
    }
}

/// Expand a range into chronological periods at the given cadence.
///
/// Daily cadence yields every calendar day from `start` to `end`
/// inclusive; monthly cadence yields every calendar month intersecting the
/// range.
pub fn periods(range: DateRange, granularity: Granularity) -> PeriodIter {
    let cursor = match granularity {
        Granularity::Daily => range.start(),
        Granularity::Monthly => range.start().replace_day(1).unwrap_or(range.start()),
    };
    PeriodIter {
        granularity,
        cursor: Some(cursor),
        end: range.end(),
    }
}

/// Number of periods [`periods`] will yield, without iterating.
pub fn period_count(range: DateRange, granularity: Granularity) -> usize {
    match granularity {
        Granularity::Daily => range.day_count(),
        Granularity::Monthly => range.month_count(),
    }
}

/// Expand a range into the ordered archive identifiers the scheduler will
/// dispatch, one per period at the descriptor's cadence.
pub fn identifiers<'a>(
    resolver: &'a PathResolver,
    descriptor: &'a CategoryDescriptor,
    symbol: &'a Symbol,
    range: DateRange,
) -> impl Iterator<Item = FileIdentifier> + 'a {
    periods(range, descriptor.granularity())
        .map(move |period| resolver.resolve(descriptor, symbol, period))
}
