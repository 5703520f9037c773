//! Data categories and their descriptors.
//!
//! The bulk-data service publishes several record families per symbol, each
//! with its own path layout, column schema, and timestamp semantics. This
//! module models that catalogue as an immutable [`CategoryRegistry`] handed
//! to the orchestrator at construction time; nothing here is a process-wide
//! global, so tests run against purpose-built descriptors.
//!
//! | Category | Timestamp column | Encoding | Cadence |
//! |----------|------------------|----------|---------|
//! | `klines` (+ premium/index/mark variants) | `open_time` | epoch ms | daily or monthly |
//! | `trades` | `time` | epoch ms | daily or monthly |
//! | `aggTrades` | `transact_time` | epoch ms | daily or monthly |
//! | `bookTicker` | `event_time` | epoch ms | daily or monthly |
//! | `metrics` | `create_time` | datetime text | daily only |
//! | `liquidationSnapshot` | `time` | epoch ms | daily only |

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Granularity, TimestampEncoding};
use crate::ValidationError;

/// Record families the service publishes, spelled as the service spells
/// them (the serde form doubles as the remote path segment).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum DataCategory {
    Klines,
    PremiumIndexKlines,
    IndexPriceKlines,
    MarkPriceKlines,
    Trades,
    AggTrades,
    BookTicker,
    Metrics,
    LiquidationSnapshot,
}

impl DataCategory {
    pub const ALL: [Self; 9] = [
        Self::Klines,
        Self::PremiumIndexKlines,
        Self::IndexPriceKlines,
        Self::MarkPriceKlines,
        Self::Trades,
        Self::AggTrades,
        Self::BookTicker,
        Self::Metrics,
        Self::LiquidationSnapshot,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Klines => "klines",
            Self::PremiumIndexKlines => "premiumIndexKlines",
            Self::IndexPriceKlines => "indexPriceKlines",
            Self::MarkPriceKlines => "markPriceKlines",
            Self::Trades => "trades",
            Self::AggTrades => "aggTrades",
            Self::BookTicker => "bookTicker",
            Self::Metrics => "metrics",
            Self::LiquidationSnapshot => "liquidationSnapshot",
        }
    }

    /// Kline-shaped categories carry a timeframe segment in their path.
    pub const fn is_kline_family(self) -> bool {
        matches!(
            self,
            Self::Klines | Self::PremiumIndexKlines | Self::IndexPriceKlines | Self::MarkPriceKlines
        )
    }

    /// The service only publishes daily bundles for these categories, so a
    /// monthly registry keeps them on daily cadence.
    pub const fn supports_monthly(self) -> bool {
        !matches!(self, Self::Metrics | Self::LiquidationSnapshot)
    }
}

impl Display for DataCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidCategory {
                value: trimmed.to_owned(),
                expected: expected_categories(),
            })
    }
}

fn expected_categories() -> String {
    DataCategory::ALL
        .iter()
        .map(|category| category.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Top-level path split between the service's publications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSegment {
    Spot,
    UsdFutures,
}

impl MarketSegment {
    /// Path prefix under the bulk-data base URL.
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::UsdFutures => "futures/um",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::UsdFutures => "um-futures",
        }
    }
}

impl Default for MarketSegment {
    fn default() -> Self {
        Self::UsdFutures
    }
}

impl Display for MarketSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketSegment {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "um" | "um-futures" | "futures-um" => Ok(Self::UsdFutures),
            other => Err(ValidationError::InvalidMarketSegment {
                value: other.to_owned(),
            }),
        }
    }
}

/// Everything the pipeline needs to know about one category: where its
/// archives live, what columns they carry, and which column orders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDescriptor {
    category: DataCategory,
    path_template: String,
    columns: Vec<String>,
    timestamp_column: String,
    timestamp_index: usize,
    timestamp_encoding: TimestampEncoding,
    granularity: Granularity,
}

impl CategoryDescriptor {
    /// Build a descriptor, validating that the timestamp column is one of
    /// the declared columns.
    ///
    /// The path template may use the placeholders `{cadence}`, `{name}`,
    /// `{symbol}` and `{period}`.
    pub fn new(
        category: DataCategory,
        path_template: impl Into<String>,
        columns: Vec<String>,
        timestamp_column: impl Into<String>,
        timestamp_encoding: TimestampEncoding,
        granularity: Granularity,
    ) -> Result<Self, ValidationError> {
        let timestamp_column = timestamp_column.into();
        if columns.is_empty() {
            return Err(ValidationError::EmptyColumns);
        }
        let timestamp_index = columns
            .iter()
            .position(|column| *column == timestamp_column)
            .ok_or_else(|| ValidationError::TimestampColumnMissing {
                column: timestamp_column.clone(),
            })?;

        Ok(Self {
            category,
            path_template: path_template.into(),
            columns,
            timestamp_column,
            timestamp_index,
            timestamp_encoding,
            granularity,
        })
    }

    pub const fn category(&self) -> DataCategory {
        self.category
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub const fn timestamp_index(&self) -> usize {
        self.timestamp_index
    }

    pub const fn timestamp_encoding(&self) -> TimestampEncoding {
        self.timestamp_encoding
    }

    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }
}

/// Path template for kline-shaped archives (fixed 1-minute timeframe).
const KLINE_TEMPLATE: &str = "{cadence}/{name}/{symbol}/1m/{symbol}-1m-{period}.zip";
/// Path template for every other archive family.
const FLAT_TEMPLATE: &str = "{cadence}/{name}/{symbol}/{symbol}-{name}-{period}.zip";

/// Immutable category lookup table consumed by the orchestrator.
///
/// An unknown category is a configuration error, surfaced by the
/// orchestrator before any network activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRegistry {
    entries: BTreeMap<DataCategory, CategoryDescriptor>,
}

impl CategoryRegistry {
    /// Registry with no entries; every lookup fails until descriptors are
    /// added with [`with_descriptor`](Self::with_descriptor).
    pub fn empty() -> Self {
        Self::default()
    }

    /// All built-in categories on daily cadence.
    pub fn builtin() -> Self {
        Self::builtin_with(Granularity::Daily)
    }

    /// All built-in categories on the requested cadence. Categories the
    /// service publishes daily-only stay daily regardless.
    pub fn builtin_with(granularity: Granularity) -> Self {
        let mut registry = Self::empty();
        for category in DataCategory::ALL {
            let cadence = if category.supports_monthly() {
                granularity
            } else {
                Granularity::Daily
            };
            if let Some(descriptor) = builtin_descriptor(category, cadence) {
                registry = registry.with_descriptor(descriptor);
            }
        }
        registry
    }

    /// Add or replace one descriptor, keyed by its category.
    pub fn with_descriptor(mut self, descriptor: CategoryDescriptor) -> Self {
        self.entries.insert(descriptor.category(), descriptor);
        self
    }

    pub fn descriptor(&self, category: DataCategory) -> Option<&CategoryDescriptor> {
        self.entries.get(&category)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CategoryDescriptor> {
        self.entries.values()
    }

    pub fn categories(&self) -> impl Iterator<Item = DataCategory> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_descriptor(
    category: DataCategory,
    granularity: Granularity,
) -> Option<CategoryDescriptor> {
    let template = if category.is_kline_family() {
        KLINE_TEMPLATE
    } else {
        FLAT_TEMPLATE
    };
    let (columns, timestamp_column, encoding) = builtin_schema(category);

    CategoryDescriptor::new(
        category,
        template,
        to_owned_columns(columns),
        timestamp_column,
        encoding,
        granularity,
    )
    .ok()
}

const KLINE_COLUMNS: &[&str] = &[
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
    "quote_volume",
    "count",
    "taker_buy_volume",
    "taker_buy_quote_volume",
    "ignore",
];

fn builtin_schema(category: DataCategory) -> (&'static [&'static str], &'static str, TimestampEncoding) {
    match category {
        DataCategory::Klines
        | DataCategory::PremiumIndexKlines
        | DataCategory::IndexPriceKlines
        | DataCategory::MarkPriceKlines => (KLINE_COLUMNS, "open_time", TimestampEncoding::EpochMillis),
        DataCategory::Trades => (
            &["id", "price", "qty", "quote_qty", "time", "is_buyer_maker"],
            "time",
            TimestampEncoding::EpochMillis,
        ),
        DataCategory::AggTrades => (
            &[
                "agg_trade_id",
                "price",
                "quantity",
                "first_trade_id",
                "last_trade_id",
                "transact_time",
                "is_buyer_maker",
            ],
            "transact_time",
            TimestampEncoding::EpochMillis,
        ),
        DataCategory::BookTicker => (
            &[
                "update_id",
                "best_bid_price",
                "best_bid_qty",
                "best_ask_price",
                "best_ask_qty",
                "transaction_time",
                "event_time",
            ],
            "event_time",
            TimestampEncoding::EpochMillis,
        ),
        DataCategory::Metrics => (
            &[
                "create_time",
                "symbol",
                "sum_open_interest",
                "sum_open_interest_value",
                "count_toptrader_long_short_ratio",
                "sum_toptrader_long_short_ratio",
                "count_long_short_ratio",
                "sum_taker_long_short_vol_ratio",
            ],
            "create_time",
            TimestampEncoding::DateTimeText,
        ),
        DataCategory::LiquidationSnapshot => (
            &[
                "time",
                "symbol",
                "side",
                "order_type",
                "time_in_force",
                "original_quantity",
                "price",
                "average_price",
                "order_status",
                "last_fill_quantity",
                "accumulated_fill_quantity",
            ],
            "time",
            TimestampEncoding::EpochMillis,
        ),
    }
}

fn to_owned_columns(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| (*column).to_owned()).collect()
}
