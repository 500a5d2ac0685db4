//! Chart data model.
//!
//! A chart is a named collection of series; a series is an append-only list
//! of time/value points. Values are exact decimals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rendering kind of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Series drawn on top of each other.
    Overlay,
    /// Series drawn in stacked panes.
    Stacked,
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlay => write!(f, "overlay"),
            Self::Stacked => write!(f, "stacked"),
        }
    }
}

/// Rendering kind of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    /// Line chart.
    Line,
    /// Scatter points.
    Scatter,
    /// OHLC candles.
    Candle,
    /// Bar chart.
    Bar,
    /// Flags on the time axis.
    Flag,
    /// Stacked area.
    StackedArea,
    /// Pie chart.
    Pie,
    /// Treemap.
    Treemap,
}

/// A single (timestamp, value) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// When the value was observed.
    pub time: DateTime<Utc>,
    /// The observed value.
    pub value: Decimal,
}

impl ChartPoint {
    /// Creates a new chart point.
    #[must_use]
    pub fn new(time: DateTime<Utc>, value: Decimal) -> Self {
        Self { time, value }
    }
}

/// A named, ordered sequence of points within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Series name, unique within its chart.
    pub name: String,
    /// Declared rendering kind.
    pub series_type: SeriesType,
    /// Points in arrival order.
    #[serde(default)]
    pub values: Vec<ChartPoint>,
}

impl Series {
    /// Creates an empty series.
    #[must_use]
    pub fn new(name: impl Into<String>, series_type: SeriesType) -> Self {
        Self {
            name: name.into(),
            series_type,
            values: Vec::new(),
        }
    }

    /// Appends a point (builder form, used when assembling merge batches).
    #[must_use]
    pub fn with_point(mut self, time: DateTime<Utc>, value: Decimal) -> Self {
        self.values.push(ChartPoint::new(time, value));
        self
    }

    /// Appends a point.
    pub fn add_point(&mut self, time: DateTime<Utc>, value: Decimal) {
        self.values.push(ChartPoint::new(time, value));
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A named collection of series sharing a rendering kind.
///
/// # Example
///
/// ```
/// use reporting::models::{Chart, ChartType, Series, SeriesType};
/// use rust_decimal::Decimal;
/// use chrono::Utc;
///
/// let chart = Chart::new("Benchmark", ChartType::Overlay)
///     .with_series(Series::new("SPY", SeriesType::Line).with_point(Utc::now(), Decimal::from(410)));
///
/// assert_eq!(chart.series["SPY"].len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Chart name, unique within a run.
    pub name: String,
    /// Declared rendering kind.
    pub chart_type: ChartType,
    /// Series keyed by name.
    #[serde(default)]
    pub series: HashMap<String, Series>,
}

impl Chart {
    /// Creates an empty chart.
    #[must_use]
    pub fn new(name: impl Into<String>, chart_type: ChartType) -> Self {
        Self {
            name: name.into(),
            chart_type,
            series: HashMap::new(),
        }
    }

    /// Adds a series, replacing any series of the same name.
    #[must_use]
    pub fn with_series(mut self, series: Series) -> Self {
        self.series.insert(series.name.clone(), series);
        self
    }

    /// Returns the series with the given name, creating it with
    /// `series_type` when absent. An existing series keeps its kind.
    pub fn series_or_insert(&mut self, name: &str, series_type: SeriesType) -> &mut Series {
        self.series
            .entry(name.to_string())
            .or_insert_with(|| Series::new(name, series_type))
    }

    /// Total number of points across all series.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_series_or_insert_keeps_first_kind() {
        let mut chart = Chart::new("Strategy Equity", ChartType::Stacked);

        chart
            .series_or_insert("Equity", SeriesType::Candle)
            .add_point(ts(0), Decimal::from(100));
        chart
            .series_or_insert("Equity", SeriesType::Line)
            .add_point(ts(60), Decimal::from(101));

        let series = &chart.series["Equity"];
        assert_eq!(series.series_type, SeriesType::Candle);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_point_count() {
        let chart = Chart::new("c", ChartType::Overlay)
            .with_series(
                Series::new("a", SeriesType::Line)
                    .with_point(ts(0), Decimal::ONE)
                    .with_point(ts(1), Decimal::from(2)),
            )
            .with_series(Series::new("b", SeriesType::Bar).with_point(ts(0), Decimal::ONE));

        assert_eq!(chart.point_count(), 3);
    }

    #[test]
    fn test_decimal_value_is_exact_through_json() {
        let point = ChartPoint::new(ts(0), Decimal::new(1_000_000_01, 2));
        let json = serde_json::to_string(&point).unwrap();
        let back: ChartPoint = serde_json::from_str(&json).unwrap();

        assert_eq!(back.value.to_string(), "1000000.01");
    }

    #[test]
    fn test_points_keep_insertion_order() {
        let series = Series::new("s", SeriesType::Line)
            .with_point(ts(0), Decimal::ONE)
            .with_point(ts(5), Decimal::TEN);

        assert_eq!(series.len(), 2);
        assert_eq!(series.values[1].value, Decimal::TEN);
        assert!(!series.is_empty());
    }
}
