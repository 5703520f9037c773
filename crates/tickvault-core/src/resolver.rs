//! Pure mapping from `(symbol, category, period)` to a remote archive URL.

use serde::Serialize;

use crate::category::{CategoryDescriptor, DataCategory, MarketSegment};
use crate::domain::{ArchivePeriod, Symbol};

/// Public bulk-data host all built-in descriptors resolve against.
pub const DEFAULT_BASE_URL: &str = "https://data.binance.vision/data";

/// One remote archive to fetch: the expander produces one of these per
/// period in the requested range, and nothing downstream re-derives paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIdentifier {
    pub symbol: Symbol,
    pub category: DataCategory,
    pub period: ArchivePeriod,
    pub remote_path: String,
}

/// Renders a descriptor's path template into full archive URLs.
///
/// Stateless beyond its configuration; resolving the same inputs always
/// yields the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base_url: String,
    segment: MarketSegment,
}

impl PathResolver {
    pub fn new(base_url: impl Into<String>, segment: MarketSegment) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, segment }
    }

    pub const fn segment(&self) -> MarketSegment {
        self.segment
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(
        &self,
        descriptor: &CategoryDescriptor,
        symbol: &Symbol,
        period: ArchivePeriod,
    ) -> FileIdentifier {
        let rendered = descriptor
            .path_template()
            .replace("{cadence}", period.granularity().as_str())
            .replace("{name}", descriptor.category().as_str())
            .replace("{symbol}", symbol.as_str())
            .replace("{period}", &period.label());

        FileIdentifier {
            symbol: symbol.clone(),
            category: descriptor.category(),
            period,
            remote_path: format!(
                "{}/{}/{}",
                self.base_url,
                self.segment.path_segment(),
                rendered
            ),
        }
    }
}
