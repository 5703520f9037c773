use serde::Serialize;

use crate::category::DataCategory;
use crate::domain::{ArchivePeriod, Symbol, Timestamp};

/// One exchange-reported record, parsed out of an archive.
///
/// Fields keep the wire text verbatim (column meaning differs per
/// category); the timestamp column is additionally parsed so merged
/// datasets can be ordered without re-reading field text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub timestamp: Timestamp,
    pub fields: Vec<String>,
}

/// Decoded rows of a single archive, tagged with the period it covers.
///
/// A zero-row set is a valid outcome: the service publishes empty archives
/// for days an instrument traded nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSet {
    pub period: ArchivePeriod,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(period: ArchivePeriod, rows: Vec<Row>) -> Self {
        Self { period, rows }
    }

    pub fn empty(period: ArchivePeriod) -> Self {
        Self::new(period, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The merged, timestamp-ordered table a download run produces.
///
/// `periods` lists every period that contributed a decoded archive, in
/// chronological order, including archives that decoded to zero rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub symbol: Symbol,
    pub category: DataCategory,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub periods: Vec<ArchivePeriod>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamp of the earliest record, when any.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.rows.first().map(|row| row.timestamp)
    }

    /// Timestamp of the latest record, when any.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.rows.last().map(|row| row.timestamp)
    }
}
