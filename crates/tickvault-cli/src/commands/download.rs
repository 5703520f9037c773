//! Download archives for one symbol and category, then render the merged
//! dataset in the requested format.

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use tickvault_core::{
    date_label, last_closed_utc_day, ArchiveDownloader, CancelToken, CategoryRegistry,
    DataCategory, DateRange, DownloadError, DownloadRequest, RequestPacer, RetryConfig, Symbol,
    ValidationError,
};

use crate::cli::{Cli, DownloadArgs, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::progress;

pub async fn run(cli: &Cli, args: &DownloadArgs) -> Result<usize, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let category: DataCategory = args.category.parse()?;
    let requested = DateRange::parse(&args.start, &args.end)?;

    let latest = last_closed_utc_day();
    let range = match requested.clamp_end_to(latest) {
        Some(range) => {
            if range.end() < requested.end() {
                tracing::warn!(
                    requested = %date_label(requested.end()),
                    clamped = %date_label(range.end()),
                    "end date adjusted to the last closed UTC day"
                );
            }
            range
        }
        None => {
            return Err(CliError::Command(format!(
                "range starts {} but the last closed UTC day is {}",
                date_label(requested.start()),
                date_label(latest)
            )));
        }
    };

    let registry = CategoryRegistry::builtin_with(args.granularity.to_granularity());
    let timestamp_index = registry
        .descriptor(category)
        .map(|descriptor| descriptor.timestamp_index())
        .ok_or(DownloadError::UnregisteredCategory { category })?;

    let mut retry = if args.no_retry {
        RetryConfig::no_retry()
    } else {
        RetryConfig::exponential(args.max_retries)
    };
    retry.timeout_ms = cli.timeout_ms;

    let concurrency =
        NonZeroUsize::new(args.concurrency).ok_or(ValidationError::InvalidConcurrency)?;

    let mut downloader = ArchiveDownloader::new()
        .with_registry(registry)
        .with_segment(args.market.to_segment())
        .with_retry(retry)
        .with_concurrency(concurrency);

    if let Some(base_url) = &cli.base_url {
        downloader = downloader.with_base_url(base_url.clone());
    }
    if let Some(limit) = args.rate_limit {
        downloader = downloader.with_pacer(RequestPacer::new(limit, Duration::from_secs(60)));
    }
    if !cli.quiet {
        downloader = downloader.with_progress(progress::stderr_observer());
    }

    let cancel = CancelToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling pending archives");
            watcher.cancel();
        }
    });

    let request = DownloadRequest::from_parts(symbol, category, range);
    let outcome = downloader.download_with_cancel(&request, &cancel).await?;

    for failure in &outcome.failures {
        tracing::warn!(
            archive = %failure.identifier.remote_path,
            code = failure.error.code(),
            "archive failed: {}",
            failure.error.message()
        );
    }

    let mut target = output::open_target(args.output.as_deref())?;
    match cli.format {
        OutputFormat::Csv => {
            output::write_dataset_csv(&mut target, &outcome.dataset, timestamp_index)?;
        }
        OutputFormat::Json => {
            writeln!(target, "{}", output::render_download_json(&outcome, cli.pretty)?)?;
        }
        OutputFormat::Table => {
            writeln!(target, "{}", output::render_download_table(&outcome))?;
        }
    }

    if let Some(path) = &args.output {
        eprintln!(
            "✓ wrote {} rows to {}",
            outcome.dataset.len(),
            path.display()
        );
    }

    Ok(outcome.failures.len())
}
