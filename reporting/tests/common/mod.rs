//! Common test utilities and helpers for integration tests.
//!
//! This module provides handler builders, a recording sink and time helpers
//! shared by the integration test binaries.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use reporting::config::HandlerConfig;
use reporting::policy::RunDescriptor;
use reporting::sink::InMemorySink;
use reporting::ResultHandler;
use std::sync::Arc;
use std::time::Instant;

/// Installs a test subscriber so `RUST_LOG` output shows up in failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A fast-cycling configuration for tests.
pub fn fast_config() -> HandlerConfig {
    HandlerConfig::default()
        .with_poll_interval_ms(2)
        .with_notification_period_ms(10)
}

/// Midnight UTC of `2020-01-01` plus `n` days.
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// A bounded run from day 0 to day `days`.
pub fn backtest(days: i64) -> RunDescriptor {
    RunDescriptor::bounded(day(0), day(days)).unwrap()
}

/// Creates a handler with a recording sink. The loop is not started.
pub fn test_handler(run: RunDescriptor) -> (ResultHandler, Arc<InMemorySink>) {
    init_tracing();
    let sink = InMemorySink::new_shared();
    let handler = ResultHandler::new(run, fast_config(), sink.clone()).unwrap();
    (handler, sink)
}

/// Polls `condition` until it holds or five seconds pass.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + std::time::Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    condition()
}
