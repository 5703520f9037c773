//! CLI argument definitions for Tickvault.
//!
//! This module contains the command-line interface structure using Clap.
//! The CLI downloads bulk historical market-data archives and inspects the
//! category registry.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `download` | Download and merge archives for one symbol and category |
//! | `categories` | List registered data categories and their schemas |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `csv` | Output format (csv, json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--base-url` | service default | Override the bulk-data host |
//! | `--timeout-ms` | `30000` | Per-attempt HTTP timeout in ms |
//! | `--quiet` | `false` | Suppress progress and non-error logs |
//! | `--verbose` | `false` | Enable debug logging |
//!
//! # Examples
//!
//! ```bash
//! # One week of trades, merged to stdout as CSV
//! tickvault download BTCUSDT trades --start 2023-01-01 --end 2023-01-07
//!
//! # Spot klines into a file, 4 at a time
//! tickvault download ETHUSDT klines --start 2023-06-01 --end 2023-06-30 \
//!     --market spot --concurrency 4 --output eth-june.csv
//!
//! # Monthly archives where the category publishes them
//! tickvault download BTCUSDT aggTrades --start 2023-01-01 --end 2023-06-30 \
//!     --granularity monthly
//!
//! # Inspect the registry
//! tickvault categories --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickvault_core::{Granularity, MarketSegment, DEFAULT_CONCURRENCY};

/// 🧱 Tickvault - Bulk historical market-data downloader
///
/// Download daily or monthly archives from the public bulk-data host,
/// decode them, and merge them into one timestamp-ordered table.
///
/// For more information, see: <https://github.com/tickvault/tickvault>
#[derive(Debug, Parser)]
#[command(
    name = "tickvault",
    author,
    version,
    about = "Bulk historical market-data downloader",
    long_about = "Tickvault downloads bulk historical market-data archives and merges them \
into one ordered dataset. Features include:\n\
\n\
  • Nine data categories across spot and USD-margined futures\n\
  • Daily and monthly archive cadence\n\
  • Bounded-concurrency downloads with retry and rate-limit pacing\n\
  • Deterministic, timestamp-ordered CSV/JSON output\n\
  • Partial-failure reporting per archive\n\
\n\
Use 'tickvault <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - csv: Delimited rows with a header line (default)
    /// - json: Single JSON report object
    /// - table: Human-readable summary
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Override the bulk-data host base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-attempt HTTP timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Suppress progress output and informational logs.
    #[arg(long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Enable debug logging on stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Delimited rows with a header line.
    Csv,
    /// Single JSON report object.
    Json,
    /// Human-readable summary table.
    Table,
}

/// Market segment whose archives are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    /// Spot market archives.
    Spot,
    /// USD-margined futures archives.
    UmFutures,
}

impl MarketArg {
    pub const fn to_segment(self) -> MarketSegment {
        match self {
            Self::Spot => MarketSegment::Spot,
            Self::UmFutures => MarketSegment::UsdFutures,
        }
    }
}

/// Archive cadence to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GranularityArg {
    /// One archive per calendar day.
    Daily,
    /// One archive per calendar month, where the category publishes them.
    Monthly,
}

impl GranularityArg {
    pub const fn to_granularity(self) -> Granularity {
        match self {
            Self::Daily => Granularity::Daily,
            Self::Monthly => Granularity::Monthly,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 📥 Download and merge archives for one symbol and category.
    ///
    /// Expands the date range into one archive per period, downloads them
    /// with bounded concurrency, and merges the decoded rows into a single
    /// timestamp-ordered table. Days without published data are reported,
    /// not fatal; the exit code is 3 when any archive failed.
    ///
    /// # Examples
    ///
    ///   tickvault download BTCUSDT trades --start 2023-01-01 --end 2023-01-07
    ///   tickvault download ETHUSDT klines --start 2023-06-01 --end 2023-06-30 --market spot
    ///   tickvault download BTCUSDT metrics --start 2023-01-01 --end 2023-01-31 --output metrics.csv
    Download(DownloadArgs),

    /// 📚 List registered data categories and their schemas.
    ///
    /// Shows every category the downloader knows: its service name, which
    /// cadences it publishes, and the column schema archives decode against.
    ///
    /// # Examples
    ///
    ///   tickvault categories
    ///   tickvault categories --format table
    Categories,
}

/// Arguments for the `download` command.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Instrument symbol (e.g., BTCUSDT).
    pub symbol: String,

    /// Data category to download.
    ///
    /// Supported categories: klines, premiumIndexKlines, indexPriceKlines,
    /// markPriceKlines, trades, aggTrades, bookTicker, metrics,
    /// liquidationSnapshot (case-insensitive).
    pub category: String,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start: String,

    /// Last day of the range, inclusive (YYYY-MM-DD).
    ///
    /// Clamped to the last closed UTC day; the service never publishes
    /// the current day.
    #[arg(long)]
    pub end: String,

    /// Market segment archives are read from.
    #[arg(long, value_enum, default_value_t = MarketArg::UmFutures)]
    pub market: MarketArg,

    /// Archive cadence.
    ///
    /// Categories that only publish daily archives stay daily even when
    /// monthly is requested.
    #[arg(long, value_enum, default_value_t = GranularityArg::Daily)]
    pub granularity: GranularityArg,

    /// Archives downloaded in parallel.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Retries per archive after the first attempt.
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Fail each archive on its first error instead of retrying.
    #[arg(long, default_value_t = false)]
    pub no_retry: bool,

    /// Cap requests per minute across all workers.
    #[arg(long)]
    pub rate_limit: Option<u32>,

    /// Write output to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_internally_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn download_accepts_the_documented_surface() {
        let cli = Cli::parse_from([
            "tickvault",
            "download",
            "BTCUSDT",
            "trades",
            "--start",
            "2023-01-01",
            "--end",
            "2023-01-07",
            "--market",
            "spot",
            "--concurrency",
            "4",
        ]);

        match cli.command {
            Command::Download(args) => {
                assert_eq!(args.symbol, "BTCUSDT");
                assert_eq!(args.category, "trades");
                assert_eq!(args.market, MarketArg::Spot);
                assert_eq!(args.concurrency, 4);
                assert_eq!(args.granularity, GranularityArg::Daily);
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn defaults_match_the_documented_table() {
        let cli = Cli::parse_from([
            "tickvault",
            "download",
            "BTCUSDT",
            "trades",
            "--start",
            "2023-01-01",
            "--end",
            "2023-01-02",
        ]);

        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(cli.timeout_ms, 30_000);
        assert!(!cli.quiet);
        assert!(cli.base_url.is_none());

        match cli.command {
            Command::Download(args) => {
                assert_eq!(args.concurrency, DEFAULT_CONCURRENCY);
                assert_eq!(args.max_retries, 2);
                assert!(!args.no_retry);
                assert!(args.rate_limit.is_none());
            }
            other => panic!("expected download, got {other:?}"),
        }
    }
}
