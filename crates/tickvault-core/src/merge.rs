//! Merge per-archive outcomes into one dataset plus an error list.

use crate::category::CategoryDescriptor;
use crate::domain::{Dataset, RowSet, Symbol};
use crate::error::DownloadError;
use crate::fetch::{ArchiveFailure, FetchError};
use crate::resolver::FileIdentifier;

/// Fold archive outcomes, already in request order, into a
/// timestamp-ordered [`Dataset`] and the failures that contributed
/// nothing.
///
/// Partial failure is a normal terminal state and comes back in the
/// failure list. The only fatal case is zero successes out of one or more
/// requested archives, reported as [`DownloadError::TotalFailure`] so an
/// empty dataset is never returned silently when nothing worked.
pub fn merge_outcomes(
    descriptor: &CategoryDescriptor,
    symbol: &Symbol,
    outcomes: Vec<(FileIdentifier, Result<RowSet, FetchError>)>,
) -> Result<(Dataset, Vec<ArchiveFailure>), DownloadError> {
    let requested = outcomes.len();

    let mut rows = Vec::new();
    let mut periods = Vec::new();
    let mut failures = Vec::new();

    for (identifier, outcome) in outcomes {
        match outcome {
            Ok(row_set) => {
                periods.push(row_set.period);
                rows.extend(row_set.rows);
            }
            Err(error) => failures.push(ArchiveFailure::new(identifier, error)),
        }
    }

    if requested > 0 && periods.is_empty() {
        return Err(DownloadError::TotalFailure {
            requested,
            failures,
        });
    }

    // Stable, so rows sharing a timestamp keep their archive order.
    rows.sort_by_key(|row| row.timestamp);

    let dataset = Dataset {
        symbol: symbol.clone(),
        category: descriptor.category(),
        columns: descriptor.columns().to_vec(),
        rows,
        periods,
    };

    Ok((dataset, failures))
}
