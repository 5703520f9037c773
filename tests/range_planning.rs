//! Planning tests: range expansion and path resolution decide exactly
//! which archives a run will request, before any network activity.

use tickvault_core::{
    identifiers, period_count, periods, CategoryRegistry, DataCategory, DateRange, FileIdentifier,
    Granularity, MarketSegment, PathResolver, Symbol, DEFAULT_BASE_URL,
};

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).expect("valid range")
}

fn plan(
    registry: &CategoryRegistry,
    category: DataCategory,
    segment: MarketSegment,
    range: DateRange,
) -> Vec<FileIdentifier> {
    let descriptor = registry.descriptor(category).expect("registered");
    let resolver = PathResolver::new(DEFAULT_BASE_URL, segment);
    let symbol = Symbol::parse("SOLUSDT").expect("valid symbol");
    identifiers(&resolver, descriptor, &symbol, range).collect()
}

// =============================================================================
// Planning: Daily Cadence
// =============================================================================

#[test]
fn a_daily_plan_has_one_archive_per_calendar_day_in_order() {
    let registry = CategoryRegistry::builtin();
    let expanded = plan(
        &registry,
        DataCategory::Trades,
        MarketSegment::UsdFutures,
        range("2024-02-27", "2024-03-02"),
    );

    // Five days, leap day included, strictly chronological
    assert_eq!(expanded.len(), 5);
    let labels: Vec<String> = expanded
        .iter()
        .map(|identifier| identifier.period.label())
        .collect();
    assert_eq!(
        labels,
        vec![
            "2024-02-27",
            "2024-02-28",
            "2024-02-29",
            "2024-03-01",
            "2024-03-02"
        ]
    );
}

#[test]
fn kline_plans_route_through_the_timeframe_segment() {
    let registry = CategoryRegistry::builtin();
    let expanded = plan(
        &registry,
        DataCategory::Klines,
        MarketSegment::UsdFutures,
        range("2024-03-01", "2024-03-01"),
    );

    assert_eq!(
        expanded[0].remote_path,
        "https://data.binance.vision/data/futures/um/daily/klines/SOLUSDT/1m/SOLUSDT-1m-2024-03-01.zip"
    );
}

#[test]
fn spot_plans_use_the_spot_path_prefix() {
    let registry = CategoryRegistry::builtin();
    let expanded = plan(
        &registry,
        DataCategory::Trades,
        MarketSegment::Spot,
        range("2024-03-01", "2024-03-01"),
    );

    assert_eq!(
        expanded[0].remote_path,
        "https://data.binance.vision/data/spot/daily/trades/SOLUSDT/SOLUSDT-trades-2024-03-01.zip"
    );
}

// =============================================================================
// Planning: Monthly Cadence
// =============================================================================

#[test]
fn a_monthly_plan_covers_every_intersecting_month() {
    let registry = CategoryRegistry::builtin_with(Granularity::Monthly);
    let expanded = plan(
        &registry,
        DataCategory::AggTrades,
        MarketSegment::UsdFutures,
        range("2024-01-15", "2024-03-10"),
    );

    let labels: Vec<String> = expanded
        .iter()
        .map(|identifier| identifier.period.label())
        .collect();
    assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
    assert!(expanded[0].remote_path.contains("/monthly/aggTrades/"));
}

#[test]
fn daily_only_categories_ignore_a_monthly_registry() {
    // metrics archives exist only at daily cadence on the service
    let registry = CategoryRegistry::builtin_with(Granularity::Monthly);
    let expanded = plan(
        &registry,
        DataCategory::Metrics,
        MarketSegment::UsdFutures,
        range("2024-01-01", "2024-02-29"),
    );

    assert_eq!(expanded.len(), 60);
    assert!(expanded[0].remote_path.contains("/daily/metrics/"));
}

// =============================================================================
// Planning: Counting and Determinism
// =============================================================================

#[test]
fn period_counts_match_expansion_without_iterating() {
    let span = range("2024-01-15", "2024-03-10");

    assert_eq!(
        period_count(span, Granularity::Daily),
        periods(span, Granularity::Daily).count()
    );
    assert_eq!(
        period_count(span, Granularity::Monthly),
        periods(span, Granularity::Monthly).count()
    );
    assert_eq!(period_count(span, Granularity::Monthly), 3);
}

#[test]
fn replanning_the_same_inputs_yields_the_identical_plan() {
    let registry = CategoryRegistry::builtin();
    let span = range("2024-03-01", "2024-03-07");

    let first = plan(
        &registry,
        DataCategory::BookTicker,
        MarketSegment::UsdFutures,
        span,
    );
    let second = plan(
        &registry,
        DataCategory::BookTicker,
        MarketSegment::UsdFutures,
        span,
    );

    assert_eq!(first, second);
}

#[test]
fn a_plan_never_repeats_an_archive() {
    let registry = CategoryRegistry::builtin();
    let expanded = plan(
        &registry,
        DataCategory::Trades,
        MarketSegment::UsdFutures,
        range("2023-12-25", "2024-01-05"),
    );

    let mut paths: Vec<&str> = expanded
        .iter()
        .map(|identifier| identifier.remote_path.as_str())
        .collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), expanded.len());
}
