//! Configuration module for the results-reporting core.
//!
//! This module contains the timing configuration passed to a result handler.

pub mod handler;

pub use handler::{ConfigError, HandlerConfig, MAX_RESAMPLE_PERIOD_SECS};
