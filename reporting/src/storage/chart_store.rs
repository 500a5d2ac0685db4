//! Chart storage trait and implementations.
//!
//! Provides the `ChartStore` trait for the chart aggregation store and an
//! `InMemoryChartStore` guarded by a single store-wide lock.

use crate::models::{Chart, ChartPoint, ChartType, SeriesType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Name of the canonical equity chart.
pub const STRATEGY_EQUITY_CHART: &str = "Strategy Equity";

/// Name of the equity series on the equity chart.
pub const EQUITY_SERIES: &str = "Equity";

/// Name of the daily performance series on the equity chart.
pub const DAILY_PERFORMANCE_SERIES: &str = "Daily Performance";

/// Trait for chart storage implementations.
///
/// Sampling is infallible: a reporting store must never fail the algorithm
/// it observes. Implementations must be thread-safe (Send + Sync).
pub trait ChartStore: Send + Sync {
    /// Appends a point to `series` on `chart`, creating either when absent.
    ///
    /// The kinds are only used when the chart or series is created; later
    /// calls with different kinds leave the stored kinds untouched.
    fn sample(
        &self,
        chart: &str,
        chart_type: ChartType,
        series: &str,
        series_type: SeriesType,
        time: DateTime<Utc>,
        value: Decimal,
    );

    /// Merges a batch of charts into the store.
    ///
    /// Missing charts and series are created with the incoming kinds; points
    /// of existing series are appended, never replaced. The batch is applied
    /// atomically with respect to concurrent `sample` calls.
    fn merge(&self, charts: Vec<Chart>);

    /// Returns a consistent copy of every chart, keyed by name.
    fn snapshot(&self) -> BTreeMap<String, Chart>;

    /// Returns the number of charts.
    fn chart_count(&self) -> usize;

    /// Returns a copy of the points of one series, if it exists.
    fn series_points(&self, chart: &str, series: &str) -> Option<Vec<ChartPoint>>;

    /// Samples the strategy equity.
    fn sample_equity(&self, time: DateTime<Utc>, value: Decimal) {
        self.sample(
            STRATEGY_EQUITY_CHART,
            ChartType::Stacked,
            EQUITY_SERIES,
            SeriesType::Candle,
            time,
            value,
        );
    }

    /// Samples the daily performance.
    fn sample_performance(&self, time: DateTime<Utc>, value: Decimal) {
        self.sample(
            STRATEGY_EQUITY_CHART,
            ChartType::Overlay,
            DAILY_PERFORMANCE_SERIES,
            SeriesType::Line,
            time,
            value,
        );
    }
}

/// In-memory chart store implementation.
#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    charts: Arc<RwLock<HashMap<String, Chart>>>,
}

impl InMemoryChartStore {
    /// Creates a new empty in-memory chart store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            charts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a new in-memory chart store wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ChartStore for InMemoryChartStore {
    fn sample(
        &self,
        chart: &str,
        chart_type: ChartType,
        series: &str,
        series_type: SeriesType,
        time: DateTime<Utc>,
        value: Decimal,
    ) {
        // A panicking producer must not take reporting down with it.
        let mut charts = self.charts.write().unwrap_or_else(PoisonError::into_inner);
        charts
            .entry(chart.to_string())
            .or_insert_with(|| Chart::new(chart, chart_type))
            .series_or_insert(series, series_type)
            .add_point(time, value);
    }

    fn merge(&self, incoming: Vec<Chart>) {
        let mut charts = self.charts.write().unwrap_or_else(PoisonError::into_inner);
        for update in incoming {
            let chart = charts
                .entry(update.name.clone())
                .or_insert_with(|| Chart::new(update.name.clone(), update.chart_type));

            for (name, series) in update.series {
                chart
                    .series_or_insert(&name, series.series_type)
                    .values
                    .extend(series.values);
            }
        }
    }

    fn snapshot(&self) -> BTreeMap<String, Chart> {
        let charts = self.charts.read().unwrap_or_else(PoisonError::into_inner);
        charts
            .iter()
            .map(|(name, chart)| (name.clone(), chart.clone()))
            .collect()
    }

    fn chart_count(&self) -> usize {
        self.charts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn series_points(&self, chart: &str, series: &str) -> Option<Vec<ChartPoint>> {
        let charts = self.charts.read().unwrap_or_else(PoisonError::into_inner);
        charts
            .get(chart)
            .and_then(|c| c.series.get(series))
            .map(|s| s.values.clone())
    }
}
