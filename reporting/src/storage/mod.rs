//! Storage traits and implementations.
//!
//! The `ChartStore` trait defines the interface for chart aggregation,
//! allowing the handler to work against any thread-safe implementation.

pub mod chart_store;

pub use chart_store::{
    ChartStore, InMemoryChartStore, DAILY_PERFORMANCE_SERIES, EQUITY_SERIES,
    STRATEGY_EQUITY_CHART,
};
