//! Result handler facade.
//!
//! `ResultHandler` is the surface the algorithm host calls. Log-like calls
//! become queue messages consumed by the background loop; sampling calls go
//! straight to the chart store; order events, statistics and status updates
//! are rendered and handed to the trace sink.

use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::models::{AlgorithmStatus, Chart, FinalReport, Message, OrderEvent, SecurityType};
use crate::models::{ChartType, SeriesType};
use crate::policy::{RunDescriptor, RunDescriptorInput, SamplingPolicy};
use crate::queue::{ConsumerLoop, HandlerState, Lifecycle, MessageQueue};
use crate::sink::TraceSink;
use crate::storage::{ChartStore, InMemoryChartStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Asynchronous results handler for one algorithm run.
///
/// # Example
///
/// ```
/// use reporting::config::HandlerConfig;
/// use reporting::handler::ResultHandler;
/// use reporting::policy::RunDescriptor;
/// use reporting::sink::InMemorySink;
/// use std::sync::Arc;
///
/// let sink = InMemorySink::new_shared();
/// let handler = ResultHandler::new(
///     RunDescriptor::Unbounded,
///     HandlerConfig::default().with_poll_interval_ms(5),
///     sink.clone(),
/// )
/// .unwrap();
///
/// handler.start().unwrap();
/// handler.log("Algorithm initialized");
/// handler.shutdown();
///
/// assert!(!handler.is_active());
/// assert!(sink.contains("Algorithm initialized"));
/// ```
pub struct ResultHandler {
    policy: SamplingPolicy,
    config: HandlerConfig,
    queue: MessageQueue,
    charts: Arc<dyn ChartStore>,
    sink: Arc<dyn TraceSink>,
    lifecycle: Arc<Lifecycle>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ResultHandler {
    /// Creates a handler with an in-memory chart store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(
        descriptor: RunDescriptor,
        config: HandlerConfig,
        sink: Arc<dyn TraceSink>,
    ) -> Result<Self, HandlerError> {
        Self::with_store(descriptor, config, sink, InMemoryChartStore::new_shared())
    }

    /// Creates a handler from a loosely-shaped run descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither a bounded nor an unbounded
    /// shape, or if the configuration fails validation.
    pub fn from_input(
        input: RunDescriptorInput,
        config: HandlerConfig,
        sink: Arc<dyn TraceSink>,
    ) -> Result<Self, HandlerError> {
        let descriptor = RunDescriptor::try_from(input)?;
        Self::new(descriptor, config, sink)
    }

    /// Creates a handler backed by the given chart store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_store(
        descriptor: RunDescriptor,
        config: HandlerConfig,
        sink: Arc<dyn TraceSink>,
        charts: Arc<dyn ChartStore>,
    ) -> Result<Self, HandlerError> {
        config.validate_config()?;

        let mut policy = SamplingPolicy::new(descriptor);
        if let Some(period) = config.resample_period_override() {
            policy = policy.with_resample_period(period);
        }

        tracing::info!(
            mode = descriptor.mode(),
            resample_secs = policy.resample_period().num_seconds(),
            notification_ms = config.notification_period_ms,
            "Result handler created"
        );

        Ok(Self {
            policy,
            config,
            queue: MessageQueue::new(),
            charts,
            sink,
            lifecycle: Arc::new(Lifecycle::new()),
            worker: Mutex::new(None),
        })
    }

    /// Starts the consumer loop on its dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler was already started or if the thread
    /// cannot be created.
    pub fn start(&self) -> Result<(), HandlerError> {
        if !self.lifecycle.mark_started() {
            return Err(HandlerError::AlreadyStarted);
        }

        let consumer = ConsumerLoop::new(
            &self.queue,
            Arc::clone(&self.sink),
            self.policy,
            Arc::clone(&self.lifecycle),
            self.config.notification_period(),
            self.config.poll_interval(),
        );

        match consumer.spawn() {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                tracing::info!(mode = self.policy.descriptor().mode(), "Result handler started");
                Ok(())
            }
            Err(e) => {
                self.lifecycle.mark_stopped();
                tracing::error!(error = %e, "Failed to start result consumer loop");
                Err(HandlerError::Spawn(e))
            }
        }
    }

    /// Returns true while the consumer loop runs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandlerState {
        self.lifecycle.state()
    }

    /// Requests a graceful stop. The loop keeps running until the queue is
    /// empty. Idempotent.
    pub fn exit(&self) {
        if !self.lifecycle.exit_requested() {
            tracing::info!(pending = self.queue.len(), "Result handler exit requested");
        }
        self.lifecycle.request_exit();
    }

    /// Drops every queued message without processing it.
    pub fn purge_queue(&self) -> usize {
        let dropped = self.queue.purge();
        tracing::warn!(dropped, "Result queue purged");
        dropped
    }

    /// Blocks until the consumer loop has stopped. Returns immediately if the
    /// loop was never started or was already joined.
    pub fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                self.lifecycle.mark_stopped();
                tracing::error!("Result consumer loop panicked");
            }
        }
    }

    /// Requests exit and waits for the queue to drain.
    pub fn shutdown(&self) {
        self.exit();
        self.join();
    }

    /// Queues a debug line.
    pub fn debug(&self, text: impl Into<String>) {
        self.queue.enqueue(Message::debug(text));
    }

    /// Queues a log line.
    pub fn log(&self, text: impl Into<String>) {
        self.queue.enqueue(Message::log(text));
    }

    /// Queues a runtime error.
    pub fn runtime_error(&self, text: impl Into<String>, stack_trace: Option<String>) {
        self.queue.enqueue(Message::runtime_error(text, stack_trace));
    }

    /// Queues a host error.
    pub fn error_message(&self, text: impl Into<String>, stack_trace: Option<String>) {
        self.queue.enqueue(Message::error(text, stack_trace));
    }

    /// Queues an arbitrary message.
    pub fn enqueue(&self, message: Message) {
        self.queue.enqueue(message);
    }

    /// Number of messages waiting for the consumer loop.
    #[must_use]
    pub fn pending_messages(&self) -> usize {
        self.queue.len()
    }

    /// Appends a point to a chart series, creating both when absent.
    pub fn sample(
        &self,
        chart: &str,
        chart_type: ChartType,
        series: &str,
        series_type: SeriesType,
        time: DateTime<Utc>,
        value: Decimal,
    ) {
        self.charts
            .sample(chart, chart_type, series, series_type, time, value);
    }

    /// Samples the strategy equity and advances the status watermark.
    pub fn sample_equity(&self, time: DateTime<Utc>, value: Decimal) {
        self.charts.sample_equity(time, value);
        self.lifecycle.set_last_sampled(time);
    }

    /// Samples the daily performance.
    pub fn sample_performance(&self, time: DateTime<Utc>, value: Decimal) {
        self.charts.sample_performance(time, value);
    }

    /// Merges a batch of chart updates.
    pub fn sample_range(&self, updates: Vec<Chart>) {
        self.charts.merge(updates);
    }

    /// Time of the latest equity sample.
    #[must_use]
    pub fn last_sampled(&self) -> Option<DateTime<Utc>> {
        self.lifecycle.last_sampled()
    }

    /// Returns true when a new equity sample is due at `now`.
    #[must_use]
    pub fn is_sample_due(&self, now: DateTime<Utc>) -> bool {
        self.policy.is_sample_due(self.last_sampled(), now)
    }

    /// The underlying chart store.
    #[must_use]
    pub fn charts(&self) -> &dyn ChartStore {
        self.charts.as_ref()
    }

    /// Reports an order event.
    pub fn order_event(&self, event: &OrderEvent) {
        self.sink.trace(&format!("Order Event: {event}"));
    }

    /// Reports a runtime statistic.
    pub fn runtime_statistic(&self, key: &str, value: &str) {
        self.sink.trace(&format!("Runtime Statistic: {key}: {value}"));
    }

    /// Reports an algorithm status change.
    pub fn send_status_update(&self, status: AlgorithmStatus, message: Option<&str>) {
        match message {
            Some(message) => self
                .sink
                .trace(&format!("Algorithm Status: {status} {message}")),
            None => self.sink.trace(&format!("Algorithm Status: {status}")),
        }
    }

    /// Reports the asset classes the algorithm subscribed to.
    pub fn security_types(&self, types: &[SecurityType]) {
        let names: Vec<String> = types.iter().map(ToString::to_string).collect();
        self.sink
            .trace(&format!("Security Types: {}", names.join(", ")));
    }

    /// Reports an asset price.
    pub fn sample_asset_prices(&self, symbol: &str, time: DateTime<Utc>, value: Decimal) {
        self.sink.trace(&format!(
            "Asset Price: {symbol} {} {value}",
            time.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    /// Relays externally computed statistics and returns the final report.
    ///
    /// Every statistic and banner entry is written to the trace sink in key
    /// order; nothing is computed or persisted here.
    pub fn send_final_result(
        &self,
        statistics: BTreeMap<String, String>,
        banner: BTreeMap<String, String>,
    ) -> FinalReport {
        for (name, value) in &statistics {
            self.sink.trace(&format!("STATISTICS:: {name} {value}"));
        }
        for (name, value) in &banner {
            self.sink.trace(&format!("BANNER:: {name} {value}"));
        }

        let report = FinalReport::new(self.charts.snapshot(), statistics, banner);
        tracing::info!(
            charts = report.charts.len(),
            points = report.point_count(),
            statistics = report.statistics.len(),
            "Final result assembled"
        );
        report
    }

    /// The sampling policy in use.
    #[must_use]
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Recommended interval between equity samples.
    #[must_use]
    pub fn resample_period(&self) -> chrono::Duration {
        self.policy.resample_period()
    }

    /// Status/notification cadence.
    #[must_use]
    pub fn notification_period(&self) -> std::time::Duration {
        self.config.notification_period()
    }
}

impl Drop for ResultHandler {
    fn drop(&mut self) {
        if self.lifecycle.is_active() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for ResultHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandler")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}
