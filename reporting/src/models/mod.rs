//! Data models for the results-reporting core.
//!
//! This module contains queue messages, chart structures and the order and
//! status types forwarded to the trace sink.

pub mod chart;
pub mod message;
pub mod order;
pub mod report;

pub use chart::{Chart, ChartPoint, ChartType, Series, SeriesType};
pub use message::{Message, MessageKind};
pub use order::{AlgorithmStatus, OrderEvent, OrderStatus, SecurityType};
pub use report::FinalReport;
