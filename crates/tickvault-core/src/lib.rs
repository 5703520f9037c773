//! # Tickvault Core
//!
//! Bulk historical market-data download orchestration for Tickvault.
//!
//! ## Overview
//!
//! This crate turns "give me trades for BTCUSDT over January" into a merged,
//! timestamp-ordered dataset pulled from a public bulk-archive host:
//!
//! - **Canonical domain models** for symbols, date ranges, timestamps, and datasets
//! - **Category registry** mapping each data category to its path template and schema
//! - **Range expansion** from an inclusive date range to per-period archive identifiers
//! - **Fetching** with retry, rate-limit pacing, and cooperative cancellation
//! - **Bounded-concurrency scheduling** with ordered results and progress reporting
//! - **Decoding and merging** of zipped CSV archives into one ordered dataset
//!
//! ## Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `default` | Standard feature set |
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`category`] | Data category registry, descriptors, market segments |
//! | [`decode`] | Zip/CSV archive decoding with schema validation |
//! | [`domain`] | Domain models (Symbol, DateRange, Timestamp, Dataset) |
//! | [`downloader`] | Top-level run orchestration |
//! | [`error`] | Validation and run-level error types |
//! | [`expand`] | Date range to archive identifier expansion |
//! | [`fetch`] | Per-archive retrieval with retry classification |
//! | [`http`] | HTTP client abstraction |
//! | [`merge`] | Outcome merging into one dataset plus error list |
//! | [`resolver`] | Path template rendering into archive URLs |
//! | [`retry`] | Backoff and retry policy |
//! | [`scheduler`] | Bounded-concurrency dispatch with ordered gather |
//! | [`throttle`] | Run-wide request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickvault_core::download;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = download("BTCUSDT", "trades", "2023-01-01", "2023-01-07", None).await?;
//!
//!     println!(
//!         "{} rows from {} archives ({} failed)",
//!         outcome.dataset.len(),
//!         outcome.dataset.periods.len(),
//!         outcome.failures.len()
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   CLI / Caller   │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ ArchiveDownloader│────▶│ CategoryRegistry │
//! └────────┬─────────┘     └──────────────────┘
//!          │ expand
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │    Scheduler     │────▶│  ArchiveFetcher  │
//! │ (bounded workers)│     │ (retry + pacing) │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │     Decoder      │     │   HTTP Client    │
//! │   (zip → rows)   │     │  (reqwest/test)  │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      Merger      │
//! │ (ordered dataset)│
//! └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Per-archive problems never abort a run; they come back in the outcome's
//! failure list with a structured kind:
//!
//! ```rust
//! use tickvault_core::{FetchError, FetchErrorKind};
//!
//! fn handle_error(error: FetchError) {
//!     match error.kind() {
//!         FetchErrorKind::RateLimited => {
//!             // Wait and retry the whole run later
//!         }
//!         FetchErrorKind::NotFound => {
//!             // Normal for days before an instrument listed
//!         }
//!         FetchErrorKind::SchemaMismatch => {
//!             // Report to user
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The bulk-data host is public; no credentials are sent or stored
//! - All HTTP requests use TLS
//! - Input validation on all domain types

pub mod category;
pub mod decode;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod expand;
pub mod fetch;
pub mod http;
pub mod merge;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod throttle;

// Re-export commonly used types at crate root for convenience

// Category registry
pub use category::{CategoryDescriptor, CategoryRegistry, DataCategory, MarketSegment};

// Archive decoding
pub use decode::decode_archive;

// Domain models
pub use domain::{
    date_label, last_closed_utc_day, parse_date, ArchivePeriod, Dataset, DateRange, Granularity,
    Row, RowSet, Symbol, Timestamp, TimestampEncoding,
};

// Run orchestration
pub use downloader::{
    download, ArchiveDownloader, DownloadOutcome, DownloadRequest, RunId, DEFAULT_CONCURRENCY,
};

// Error types
pub use error::{DownloadError, ValidationError};

// Range expansion
pub use expand::{identifiers, period_count, periods, PeriodIter};

// Fetching
pub use fetch::{ArchiveFailure, ArchiveFetcher, CancelToken, FetchError, FetchErrorKind};

// HTTP client types
pub use http::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoDataHttpClient, ReqwestHttpClient,
};

// Outcome merging
pub use merge::merge_outcomes;

// Path resolution
pub use resolver::{FileIdentifier, PathResolver, DEFAULT_BASE_URL};

// Retry policy
pub use retry::{Backoff, RetryConfig};

// Scheduling
pub use scheduler::{ProgressObserver, Scheduler};

// Request pacing
pub use throttle::RequestPacer;
