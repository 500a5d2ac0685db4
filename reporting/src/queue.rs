//! Message queue and its consumer loop.
//!
//! Producers on any thread push messages onto an unbounded channel without
//! blocking. A single consumer loop on a dedicated thread drains the channel,
//! dispatches each message to the trace sink and periodically reports run
//! progress. The loop stops only once exit was requested and the queue is
//! empty, so a clean shutdown never loses a message.

use crate::models::{Message, MessageKind};
use crate::policy::SamplingPolicy;
use crate::sink::TraceSink;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Name given to the consumer thread.
pub const CONSUMER_THREAD_NAME: &str = "result-consumer";

/// Multi-producer FIFO of messages.
///
/// Cloning the queue yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl MessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Enqueues a message. Never blocks.
    pub fn enqueue(&self, message: Message) {
        // The queue owns a receiver, so the channel cannot be disconnected
        // while `self` is alive.
        let _ = self.sender.send(message);
    }

    /// Drops every queued message and returns how many were dropped.
    pub fn purge(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    fn receiver(&self) -> Receiver<Message> {
        self.receiver.clone()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Observable state of the consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerState {
    /// Constructed, loop not started.
    Created,
    /// Loop running.
    Running,
    /// Exit requested, loop still draining.
    ExitRequested,
    /// Loop finished; terminal.
    Stopped,
}

impl std::fmt::Display for HandlerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::ExitRequested => write!(f, "exit_requested"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Flags shared between the handler facade and the consumer loop.
///
/// The run phase lives in a single atomic so observers never see a
/// transition the state machine does not allow.
#[derive(Debug, Default)]
pub struct Lifecycle {
    phase: AtomicU8,
    exit_requested: AtomicBool,
    last_sampled: RwLock<Option<DateTime<Utc>>>,
}

impl Lifecycle {
    /// Creates the flags in the `Created` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `Running`. Returns false if the loop was already started.
    pub fn mark_started(&self) -> bool {
        self.phase
            .compare_exchange(CREATED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves to `Stopped`.
    pub fn mark_stopped(&self) {
        self.phase.store(STOPPED, Ordering::Release);
    }

    /// Raises the exit signal. Idempotent.
    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::Release);
    }

    /// Returns true once exit was requested.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }

    /// Returns true while the loop runs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase.load(Ordering::Acquire) == RUNNING
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> HandlerState {
        match self.phase.load(Ordering::Acquire) {
            CREATED => HandlerState::Created,
            RUNNING if self.exit_requested() => HandlerState::ExitRequested,
            RUNNING => HandlerState::Running,
            _ => HandlerState::Stopped,
        }
    }

    /// Records the time of the latest equity sample.
    pub fn set_last_sampled(&self, time: DateTime<Utc>) {
        *self
            .last_sampled
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(time);
    }

    /// Time of the latest equity sample.
    #[must_use]
    pub fn last_sampled(&self) -> Option<DateTime<Utc>> {
        *self
            .last_sampled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// The single consumer of a `MessageQueue`.
pub struct ConsumerLoop {
    receiver: Receiver<Message>,
    sink: Arc<dyn TraceSink>,
    policy: SamplingPolicy,
    lifecycle: Arc<Lifecycle>,
    notification_period: Duration,
    poll_interval: Duration,
}

impl ConsumerLoop {
    /// Creates a consumer for `queue`.
    #[must_use]
    pub fn new(
        queue: &MessageQueue,
        sink: Arc<dyn TraceSink>,
        policy: SamplingPolicy,
        lifecycle: Arc<Lifecycle>,
        notification_period: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            receiver: queue.receiver(),
            sink,
            policy,
            lifecycle,
            notification_period,
            poll_interval,
        }
    }

    /// Runs the loop on a new named thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to create the thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(CONSUMER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Runs the loop on the current thread until exit is requested and the
    /// queue is empty.
    pub fn run(self) {
        tracing::debug!(
            mode = self.policy.descriptor().mode(),
            notification_period = ?self.notification_period,
            "Result consumer loop started"
        );

        let mut processed: u64 = 0;
        let mut errors: u64 = 0;
        let mut next_status = Instant::now() + self.notification_period;

        loop {
            let (drained, drained_errors) = self.drain();
            processed += drained;
            errors += drained_errors;

            if self.lifecycle.exit_requested() && self.receiver.is_empty() {
                break;
            }

            if Instant::now() >= next_status {
                self.report_status();
                next_status = Instant::now() + self.notification_period;
            }

            match self.receiver.recv_timeout(self.poll_interval) {
                Ok(message) => {
                    errors += u64::from(message.is_error());
                    self.dispatch(&message);
                    processed += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.lifecycle.mark_stopped();
        tracing::debug!(processed, errors, "Result consumer loop stopped");
    }

    /// Dispatches everything currently queued. Returns the number of
    /// messages and how many of them were errors.
    fn drain(&self) -> (u64, u64) {
        let mut count = 0;
        let mut errors = 0;
        while let Ok(message) = self.receiver.try_recv() {
            errors += u64::from(message.is_error());
            self.dispatch(&message);
            count += 1;
        }
        (count, errors)
    }

    fn dispatch(&self, message: &Message) {
        if message.kind() == MessageKind::Other {
            tracing::trace!(payload = message.text(), "Ignoring message of unknown kind");
            return;
        }

        match message.stack_trace() {
            Some(stack_trace) => self
                .sink
                .trace(&format!("{} Stack Trace: {stack_trace}", message.text())),
            None => self.sink.trace(message.text()),
        }
    }

    fn report_status(&self) {
        let Some(time) = self.lifecycle.last_sampled() else {
            return;
        };
        if let Some(line) = self.policy.status_line(time) {
            self.sink.trace(&line);
        }
    }
}
