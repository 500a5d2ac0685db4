//! Results Reporting Core
//!
//! This crate contains the asynchronous results-reporting subsystem of an
//! algorithm-execution host: a message queue drained by a dedicated consumer
//! loop, a thread-safe chart store, and the sampling policy that differs
//! between bounded (backtest) and unbounded (live) runs.
//!
//! # Modules
//!
//! - [`models`] - Messages, charts, order events and the final report
//! - [`storage`] - Chart store trait and the in-memory implementation
//! - [`policy`] - Run descriptors and the sampling cadence policy
//! - [`queue`] - Message queue, lifecycle flags and the consumer loop
//! - [`handler`] - The `ResultHandler` facade producers call
//! - [`sink`] - Trace sink abstraction
//! - [`config`] - Handler timing configuration
//!
//! # Example
//!
//! ```
//! use reporting::config::HandlerConfig;
//! use reporting::handler::ResultHandler;
//! use reporting::policy::RunDescriptor;
//! use reporting::sink::InMemorySink;
//! use chrono::{Duration, TimeZone, Utc};
//! use rust_decimal::Decimal;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let run = RunDescriptor::bounded(start, start + Duration::days(30)).unwrap();
//! let sink = InMemorySink::new_shared();
//!
//! let handler = ResultHandler::new(run, HandlerConfig::default(), sink.clone()).unwrap();
//! handler.start().unwrap();
//! handler.sample_equity(start, Decimal::from(100_000));
//! handler.debug("Warm-up complete");
//! handler.shutdown();
//!
//! assert!(sink.contains("Warm-up complete"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod handler;
pub mod models;
pub mod policy;
pub mod queue;
pub mod sink;
pub mod storage;

pub use error::HandlerError;
pub use handler::ResultHandler;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use rust_decimal;
pub use serde_json;
