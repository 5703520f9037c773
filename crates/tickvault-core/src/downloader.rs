//! Top-level orchestration of one download run.
//!
//! A run expands the requested range into archive identifiers, fans the
//! fetch+decode work out through the scheduler, and merges whatever comes
//! back. Construction is infallible; all validation happens when a
//! [`DownloadRequest`] is built.

use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::category::{CategoryRegistry, DataCategory, MarketSegment};
use crate::decode::decode_archive;
use crate::domain::{Dataset, DateRange, RowSet, Symbol};
use crate::error::{DownloadError, ValidationError};
use crate::expand::identifiers;
use crate::fetch::{ArchiveFailure, ArchiveFetcher, CancelToken, FetchError};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::merge::merge_outcomes;
use crate::resolver::{FileIdentifier, PathResolver, DEFAULT_BASE_URL};
use crate::retry::RetryConfig;
use crate::scheduler::{ProgressObserver, Scheduler};
use crate::throttle::RequestPacer;

/// Archives in flight at once unless the caller overrides it.
pub const DEFAULT_CONCURRENCY: usize = 8;

fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN)
}

/// Run identifier (UUID v4) correlating log lines of one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// What one run downloads: a symbol, a category, and an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    symbol: Symbol,
    category: DataCategory,
    range: DateRange,
}

impl DownloadRequest {
    /// Validate raw string inputs into a request.
    ///
    /// All argument problems surface here, before any network activity.
    pub fn new(
        symbol: &str,
        category: &str,
        start: &str,
        end: &str,
    ) -> Result<Self, DownloadError> {
        let symbol = Symbol::parse(symbol)?;
        let category: DataCategory = category.parse()?;
        let range = DateRange::parse(start, end)?;

        Ok(Self {
            symbol,
            category,
            range,
        })
    }

    pub fn from_parts(symbol: Symbol, category: DataCategory, range: DateRange) -> Self {
        Self {
            symbol,
            category,
            range,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn category(&self) -> DataCategory {
        self.category
    }

    pub const fn range(&self) -> DateRange {
        self.range
    }
}

/// Terminal state of a run: the merged dataset plus every archive that
/// contributed an error instead of rows.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub run_id: RunId,
    pub dataset: Dataset,
    pub failures: Vec<ArchiveFailure>,
}

impl DownloadOutcome {
    /// True when every requested archive contributed rows (or decoded empty).
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrator wiring registry, transport, retry, pacing, and concurrency
/// together. Cheap to construct per run; share the HTTP client when running
/// many downloads.
pub struct ArchiveDownloader {
    registry: CategoryRegistry,
    base_url: String,
    segment: MarketSegment,
    client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    concurrency: NonZeroUsize,
    pacer: Option<Arc<RequestPacer>>,
    on_progress: Option<ProgressObserver>,
}

impl ArchiveDownloader {
    pub fn new() -> Self {
        Self {
            registry: CategoryRegistry::builtin(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            segment: MarketSegment::default(),
            client: Arc::new(ReqwestHttpClient::new()),
            retry: RetryConfig::default(),
            concurrency: default_concurrency(),
            pacer: None,
            on_progress: None,
        }
    }

    pub fn with_registry(mut self, registry: CategoryRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_segment(mut self, segment: MarketSegment) -> Self {
        self.segment = segment;
        self
    }

    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = Some(Arc::new(pacer));
        self
    }

    pub fn with_progress(mut self, observer: ProgressObserver) -> Self {
        self.on_progress = Some(observer);
        self
    }

    pub const fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    /// Run a download to completion.
    pub async fn download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadOutcome, DownloadError> {
        self.download_with_cancel(request, &CancelToken::new())
            .await
    }

    /// Run a download that an external signal may abort.
    ///
    /// Archives still pending when the token flips settle as cancelled
    /// failures; archives already fetched stay in the dataset.
    pub async fn download_with_cancel(
        &self,
        request: &DownloadRequest,
        cancel: &CancelToken,
    ) -> Result<DownloadOutcome, DownloadError> {
        let run_id = RunId::new_v4();

        let descriptor = self
            .registry
            .descriptor(request.category())
            .ok_or(DownloadError::UnregisteredCategory {
                category: request.category(),
            })?
            .clone();

        let resolver = PathResolver::new(self.base_url.clone(), self.segment);
        let expanded: Vec<FileIdentifier> =
            identifiers(&resolver, &descriptor, request.symbol(), request.range()).collect();

        tracing::info!(
            run_id = %run_id,
            symbol = %request.symbol(),
            category = %request.category(),
            range = %request.range(),
            archives = expanded.len(),
            concurrency = self.concurrency.get(),
            "download run started"
        );

        let mut fetcher = ArchiveFetcher::new(Arc::clone(&self.client), self.retry.clone());
        if let Some(pacer) = &self.pacer {
            fetcher = fetcher.with_pacer(Arc::clone(pacer));
        }
        let fetcher = Arc::new(fetcher);
        let worker_descriptor = Arc::new(descriptor.clone());
        let worker_cancel = cancel.clone();

        let mut scheduler = Scheduler::new(self.concurrency);
        if let Some(observer) = &self.on_progress {
            scheduler = scheduler.with_progress(Arc::clone(observer));
        }

        let results = scheduler
            .run(expanded.clone(), cancel, move |identifier| {
                let fetcher = Arc::clone(&fetcher);
                let descriptor = Arc::clone(&worker_descriptor);
                let cancel = worker_cancel.clone();
                async move {
                    let bytes = fetcher.fetch(&identifier, &cancel).await?;
                    decode_archive(&descriptor, identifier.period, &bytes)
                }
            })
            .await;

        let outcomes: Vec<(FileIdentifier, Result<RowSet, FetchError>)> =
            expanded.into_iter().zip(results).collect();

        let (dataset, failures) = merge_outcomes(&descriptor, request.symbol(), outcomes)?;

        tracing::info!(
            run_id = %run_id,
            rows = dataset.len(),
            contributed = dataset.periods.len(),
            failed = failures.len(),
            "download run finished"
        );

        Ok(DownloadOutcome {
            run_id,
            dataset,
            failures,
        })
    }
}

impl Default for ArchiveDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// One-call entry point covering the common case: built-in registry,
/// default transport and retry policy, optional concurrency override.
pub async fn download(
    symbol: &str,
    category: &str,
    start: &str,
    end: &str,
    concurrency: Option<usize>,
) -> Result<DownloadOutcome, DownloadError> {
    let request = DownloadRequest::new(symbol, category, start, end)?;

    let mut downloader = ArchiveDownloader::new();
    if let Some(count) = concurrency {
        let count = NonZeroUsize::new(count).ok_or(ValidationError::InvalidConcurrency)?;
        downloader = downloader.with_concurrency(count);
    }

    downloader.download(&request).await
}
