//! Simulated algorithm used to drive a result handler from the command line.
//!
//! A backtest steps simulated time across the whole span; a live run steps
//! wall-clock time for a fixed duration. In both cases a second "host"
//! thread produces log traffic concurrently with the algorithm thread.

use chrono::{DateTime, Duration, Utc};
use reporting::models::{AlgorithmStatus, ChartType, OrderEvent, OrderStatus, SecurityType, SeriesType};
use reporting::policy::RunDescriptor;
use reporting::ResultHandler;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Knobs for a simulated run.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Starting portfolio value.
    pub starting_cash: Decimal,
    /// Wall-clock length of a live run.
    pub live_duration: std::time::Duration,
    /// Emit a debug line every this many algorithm steps.
    pub debug_every: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            starting_cash: Decimal::from(100_000),
            live_duration: std::time::Duration::from_secs(5),
            debug_every: 500,
        }
    }
}

/// Summary of what the simulation fed into the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Algorithm steps executed.
    pub steps: u64,
    /// Equity samples taken.
    pub equity_samples: u64,
    /// Order events reported.
    pub orders: u64,
    /// Final portfolio value.
    pub final_equity: Decimal,
}

/// Runs the simulated algorithm against `handler` until the run ends.
///
/// The handler must already be started; this function does not stop it.
pub fn run(handler: &Arc<ResultHandler>, settings: &SimulationSettings) -> SimulationSummary {
    handler.send_status_update(AlgorithmStatus::Initializing, None);
    handler.security_types(&[SecurityType::Equity]);

    let host_done = Arc::new(AtomicBool::new(false));
    let host = spawn_host(Arc::clone(handler), Arc::clone(&host_done));

    handler.send_status_update(AlgorithmStatus::Running, None);
    let summary = match handler.policy().descriptor() {
        RunDescriptor::Bounded { start, end } => {
            step_through(handler, settings, start, |time| (time <= end).then_some(time))
        }
        RunDescriptor::Unbounded => {
            let deadline = std::time::Instant::now() + settings.live_duration;
            let step = handler
                .resample_period()
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(1));
            step_through(handler, settings, Utc::now(), move |_| {
                if std::time::Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(step);
                Some(Utc::now())
            })
        }
    };

    host_done.store(true, Ordering::Release);
    if host.join().is_err() {
        handler.error_message("Host thread panicked", None);
    }
    handler.send_status_update(AlgorithmStatus::Completed, None);
    summary
}

/// Builds the statistics handed to `send_final_result`.
#[must_use]
pub fn statistics(summary: &SimulationSummary, starting_cash: Decimal) -> BTreeMap<String, String> {
    let net = if starting_cash.is_zero() {
        Decimal::ZERO
    } else {
        ((summary.final_equity - starting_cash) / starting_cash * Decimal::ONE_HUNDRED)
            .round_dp(3)
            .normalize()
    };

    BTreeMap::from([
        ("Total Trades".to_string(), summary.orders.to_string()),
        ("Net Profit".to_string(), format!("{net}%")),
        ("End Equity".to_string(), summary.final_equity.round_dp(2).to_string()),
    ])
}

fn step_through<F>(
    handler: &ResultHandler,
    settings: &SimulationSettings,
    start: DateTime<Utc>,
    mut advance: F,
) -> SimulationSummary
where
    F: FnMut(DateTime<Utc>) -> Option<DateTime<Utc>>,
{
    let step = handler.resample_period();
    let mut summary = SimulationSummary {
        final_equity: settings.starting_cash,
        ..SimulationSummary::default()
    };
    let mut day_open = settings.starting_cash;
    let mut current_day = start.date_naive();
    let mut time = start;

    while let Some(now) = advance(time) {
        summary.steps += 1;
        summary.final_equity = next_equity(summary.final_equity, summary.steps);

        if handler.is_sample_due(now) {
            handler.sample_equity(now, summary.final_equity);
            summary.equity_samples += 1;
        }

        if now.date_naive() != current_day {
            let change = (summary.final_equity - day_open) / day_open * Decimal::ONE_HUNDRED;
            handler.sample_performance(now, change.round_dp(4));
            handler.sample(
                "Benchmark",
                ChartType::Overlay,
                "Benchmark",
                SeriesType::Line,
                now,
                Decimal::from(400) + Decimal::from(summary.steps % 40),
            );
            handler.sample_asset_prices("SPY", now, summary.final_equity / Decimal::from(250));
            current_day = now.date_naive();
            day_open = summary.final_equity;
        }

        if summary.steps % settings.debug_every == 0 {
            handler.debug(format!("Step {} equity {}", summary.steps, summary.final_equity.round_dp(2)));
        }

        if summary.steps % (settings.debug_every * 4) == 0 {
            summary.orders += 1;
            let event = OrderEvent::new(summary.orders, "SPY", OrderStatus::Filled, now)
                .with_fill(Decimal::new(41_000, 2), Decimal::from(10));
            handler.order_event(&event);
        }

        time = now + step;
    }

    handler.runtime_statistic("Equity", &summary.final_equity.round_dp(2).to_string());
    summary
}

/// Deterministic equity walk: a small, repeating pattern of gains and losses.
fn next_equity(equity: Decimal, step: u64) -> Decimal {
    let bias = Decimal::from(i64::try_from(step % 7).unwrap_or(0) - 3);
    equity * (Decimal::ONE + bias * Decimal::new(1, 4))
}

fn spawn_host(handler: Arc<ResultHandler>, done: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut beat = 0_u64;
        while !done.load(Ordering::Acquire) {
            beat += 1;
            handler.log(format!("Host heartbeat {beat}"));
            thread::sleep(std::time::Duration::from_millis(250));
        }
    })
}

/// Helper for building a bounded run of `days` days ending now.
#[must_use]
pub fn trailing_days(days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = Utc::now();
    (end - Duration::days(days), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reporting::config::HandlerConfig;
    use reporting::sink::InMemorySink;
    use reporting::storage::{EQUITY_SERIES, STRATEGY_EQUITY_CHART};

    #[test]
    fn test_next_equity_pattern() {
        let start = Decimal::from(100_000);
        // step 3 has zero bias
        assert_eq!(next_equity(start, 3), start);
        assert!(next_equity(start, 4) > start);
        assert!(next_equity(start, 1) < start);
    }

    #[test]
    fn test_backtest_simulation_samples_on_resample_period() {
        let (start, end) = trailing_days(10);
        let sink = InMemorySink::new_shared();
        let handler = Arc::new(
            ResultHandler::new(
                RunDescriptor::bounded(start, end).unwrap(),
                HandlerConfig::default().with_poll_interval_ms(5),
                sink.clone(),
            )
            .unwrap(),
        );
        handler.start().unwrap();

        let summary = run(&handler, &SimulationSettings::default());
        handler.shutdown();

        // 10 days at the 4 minute floor.
        assert_eq!(summary.steps, 10 * 24 * 15 + 1);
        assert_eq!(summary.equity_samples, summary.steps);
        let points = handler
            .charts()
            .series_points(STRATEGY_EQUITY_CHART, EQUITY_SERIES)
            .unwrap();
        assert_eq!(points.len() as u64, summary.equity_samples);
        assert!(sink.contains("Algorithm Status: Completed"));
        assert!(sink.contains("Order Event:"));
    }

    #[test]
    fn test_statistics_net_profit() {
        let summary = SimulationSummary {
            steps: 1,
            equity_samples: 1,
            orders: 2,
            final_equity: Decimal::from(110_000),
        };
        let stats = statistics(&summary, Decimal::from(100_000));

        assert_eq!(stats["Net Profit"], "10%");
        assert_eq!(stats["Total Trades"], "2");
        assert_eq!(stats["End Equity"], "110000");
    }
}
