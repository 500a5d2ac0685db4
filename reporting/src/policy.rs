//! Sampling cadence policy.
//!
//! Converts a run descriptor into a resample period and a progress-status
//! function. Bounded (backtest) runs spread a fixed sample budget over the
//! whole span; unbounded (live) runs sample on a short fixed period and have
//! no meaningful progress percentage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of samples a bounded run aims for across its whole span.
pub const SAMPLE_BUDGET: i32 = 4000;

/// Smallest resample period of a bounded run.
#[must_use]
pub fn bounded_min_resample_period() -> Duration {
    Duration::minutes(4)
}

/// Resample period of an unbounded run.
#[must_use]
pub fn unbounded_resample_period() -> Duration {
    Duration::seconds(2)
}

/// Errors raised while building a run descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunDescriptorError {
    /// The input is neither a bounded nor an unbounded shape.
    #[error("Run descriptor must be either a start/end span or a live run: {0}")]
    InvalidShape(String),

    /// The bounded span is empty or reversed.
    #[error("Run span end {end} must be after start {start}")]
    InvalidSpan {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },
}

/// Which kind of run the handler reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunDescriptor {
    /// Historical replay with a known span.
    Bounded {
        /// First simulated instant.
        start: DateTime<Utc>,
        /// Last simulated instant.
        end: DateTime<Utc>,
    },
    /// Live run with no known end.
    Unbounded,
}

impl RunDescriptor {
    /// Creates a bounded descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if `end` is not strictly after `start`.
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RunDescriptorError> {
        if end <= start {
            return Err(RunDescriptorError::InvalidSpan { start, end });
        }
        Ok(Self::Bounded { start, end })
    }

    /// Short name of the run mode, for logs.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Bounded { .. } => "backtest",
            Self::Unbounded => "live",
        }
    }
}

/// Loosely-shaped run descriptor as read from a file or command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDescriptorInput {
    /// Start of a bounded run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// End of a bounded run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Marks an unbounded run.
    #[serde(default)]
    pub live: bool,
}

impl TryFrom<RunDescriptorInput> for RunDescriptor {
    type Error = RunDescriptorError;

    fn try_from(input: RunDescriptorInput) -> Result<Self, Self::Error> {
        match (input.start, input.end, input.live) {
            (Some(start), Some(end), false) => Self::bounded(start, end),
            (None, None, true) => Ok(Self::Unbounded),
            (_, _, true) => Err(RunDescriptorError::InvalidShape(
                "a live run cannot have a start or end".to_string(),
            )),
            (None, None, false) => Err(RunDescriptorError::InvalidShape(
                "neither a span nor a live run was given".to_string(),
            )),
            _ => Err(RunDescriptorError::InvalidShape(
                "a bounded run needs both start and end".to_string(),
            )),
        }
    }
}

/// Sampling policy derived from a run descriptor.
///
/// # Example
///
/// ```
/// use reporting::policy::{RunDescriptor, SamplingPolicy};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let run = RunDescriptor::bounded(start, start + Duration::days(100)).unwrap();
/// let policy = SamplingPolicy::new(run);
///
/// let line = policy.status_line(start + Duration::days(25)).unwrap();
/// assert!(line.contains("25.00%"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    descriptor: RunDescriptor,
    resample_period: Duration,
}

impl SamplingPolicy {
    /// Creates the policy for the given run.
    #[must_use]
    pub fn new(descriptor: RunDescriptor) -> Self {
        let resample_period = match descriptor {
            RunDescriptor::Bounded { start, end } => {
                std::cmp::max(bounded_min_resample_period(), (end - start) / SAMPLE_BUDGET)
            }
            RunDescriptor::Unbounded => unbounded_resample_period(),
        };

        Self {
            descriptor,
            resample_period,
        }
    }

    /// Replaces the derived resample period.
    #[must_use]
    pub fn with_resample_period(mut self, period: Duration) -> Self {
        self.resample_period = period;
        self
    }

    /// Returns the run descriptor.
    #[must_use]
    pub fn descriptor(&self) -> RunDescriptor {
        self.descriptor
    }

    /// Recommended interval between equity samples.
    #[must_use]
    pub fn resample_period(&self) -> Duration {
        self.resample_period
    }

    /// Returns true when a new equity sample is due at `now`.
    #[must_use]
    pub fn is_sample_due(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        last.is_none_or(|last| now - last >= self.resample_period)
    }

    /// Renders the progress indicator for `current`.
    ///
    /// Returns `None` for unbounded runs. Times outside the span produce
    /// percentages outside `[0, 100]`; they are not clamped.
    #[must_use]
    pub fn status_line(&self, current: DateTime<Utc>) -> Option<String> {
        match self.descriptor {
            RunDescriptor::Bounded { start, end } => {
                let total = end - start;
                let elapsed = current - start;

                #[allow(clippy::cast_precision_loss)]
                let percent = elapsed.num_milliseconds() as f64
                    / total.num_milliseconds() as f64
                    * 100.0;

                Some(format!(
                    "Progress: {percent:.2}% | Processed {} of {} days",
                    elapsed.num_days(),
                    total.num_days()
                ))
            }
            RunDescriptor::Unbounded => None,
        }
    }
}
