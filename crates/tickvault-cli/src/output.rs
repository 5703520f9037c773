//! Output rendering for downloaded datasets and the category registry.
//!
//! Logs and progress go to stderr; these renderers own stdout (or the
//! `--output` file), so piping CSV into another tool stays clean.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use tickvault_core::{
    ArchivePeriod, CategoryRegistry, DataCategory, Dataset, DownloadOutcome, Row, RunId,
};

use crate::error::CliError;

/// Open stdout or a file as the render target.
pub fn open_target(output: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    Ok(match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    })
}

/// Write the merged dataset as CSV: declared columns as the header, rows in
/// timestamp order, the timestamp column rendered as RFC 3339.
pub fn write_dataset_csv<W: Write>(
    target: W,
    dataset: &Dataset,
    timestamp_index: usize,
) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(target);
    writer.write_record(&dataset.columns)?;

    for row in &dataset.rows {
        let mut fields = row.fields.clone();
        if let Some(field) = fields.get_mut(timestamp_index) {
            *field = row.timestamp.to_rfc3339();
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    period: ArchivePeriod,
    path: &'a str,
    code: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadReport<'a> {
    run_id: RunId,
    symbol: &'a str,
    category: DataCategory,
    columns: &'a [String],
    row_count: usize,
    periods: &'a [ArchivePeriod],
    failures: Vec<FailureReport<'a>>,
    rows: &'a [Row],
}

/// Render the whole outcome, rows included, as one JSON report.
pub fn render_download_json(
    outcome: &DownloadOutcome,
    pretty: bool,
) -> Result<String, CliError> {
    let report = DownloadReport {
        run_id: outcome.run_id,
        symbol: outcome.dataset.symbol.as_str(),
        category: outcome.dataset.category,
        columns: &outcome.dataset.columns,
        row_count: outcome.dataset.len(),
        periods: &outcome.dataset.periods,
        failures: outcome
            .failures
            .iter()
            .map(|failure| FailureReport {
                period: failure.identifier.period,
                path: failure.identifier.remote_path.as_str(),
                code: failure.error.code(),
                message: failure.error.message(),
            })
            .collect(),
        rows: &outcome.dataset.rows,
    };

    Ok(if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    })
}

/// Render a human-readable run summary.
pub fn render_download_table(outcome: &DownloadOutcome) -> String {
    let dataset = &outcome.dataset;
    let mut lines = Vec::new();

    lines.push(format!("symbol     {}", dataset.symbol));
    lines.push(format!("category   {}", dataset.category));
    lines.push(format!("rows       {}", dataset.len()));
    lines.push(format!(
        "archives   {} contributed, {} failed",
        dataset.periods.len(),
        outcome.failures.len()
    ));
    if let (Some(first), Some(last)) = (dataset.first_timestamp(), dataset.last_timestamp()) {
        lines.push(format!(
            "span       {} .. {}",
            first.to_rfc3339(),
            last.to_rfc3339()
        ));
    }

    if !outcome.failures.is_empty() {
        lines.push(String::new());
        lines.push(String::from("failed archives:"));
        for failure in &outcome.failures {
            lines.push(format!(
                "  {}  {}  {}",
                failure.identifier.period.label(),
                failure.error.code(),
                failure.error.message()
            ));
        }
    }

    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct CategoryReport<'a> {
    name: DataCategory,
    cadence: &'static str,
    timestamp_column: &'a str,
    columns: &'a [String],
}

fn category_reports(registry: &CategoryRegistry) -> Vec<CategoryReport<'_>> {
    registry
        .descriptors()
        .map(|descriptor| CategoryReport {
            name: descriptor.category(),
            cadence: if descriptor.category().supports_monthly() {
                "daily, monthly"
            } else {
                "daily"
            },
            timestamp_column: descriptor.timestamp_column(),
            columns: descriptor.columns(),
        })
        .collect()
}

pub fn write_categories_csv<W: Write>(
    target: W,
    registry: &CategoryRegistry,
) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(target);
    writer.write_record(["name", "cadence", "timestamp_column", "columns"])?;

    for report in category_reports(registry) {
        let columns = report.columns.join(" ");
        writer.write_record([
            report.name.as_str(),
            report.cadence,
            report.timestamp_column,
            columns.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn render_categories_json(
    registry: &CategoryRegistry,
    pretty: bool,
) -> Result<String, CliError> {
    let reports = category_reports(registry);
    Ok(if pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    })
}

pub fn render_categories_table(registry: &CategoryRegistry) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{:<22} {:<16} {:<18} columns",
        "category", "cadence", "timestamp"
    ));

    for report in category_reports(registry) {
        lines.push(format!(
            "{:<22} {:<16} {:<18} {}",
            report.name.as_str(),
            report.cadence,
            report.timestamp_column,
            report.columns.join(", ")
        ));
    }

    lines.join("\n")
}
