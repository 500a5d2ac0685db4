//! Queue message model.
//!
//! Defines the `Message` envelope that producers push onto the result queue
//! and the consumer loop dispatches by kind.

use serde::{Deserialize, Serialize};

/// Kind tag of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Algorithm log line.
    Log,
    /// Algorithm debug line.
    Debug,
    /// Error raised while the algorithm was running.
    RuntimeError,
    /// Error reported by the host.
    Error,
    /// Any kind the consumer loop does not know how to handle.
    Other,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Debug => write!(f, "debug"),
            Self::RuntimeError => write!(f, "runtime_error"),
            Self::Error => write!(f, "error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A message produced by the algorithm and consumed exactly once by the
/// consumer loop.
///
/// # Example
///
/// ```
/// use reporting::models::{Message, MessageKind};
///
/// let msg = Message::runtime_error("Division by zero", Some("at OnData()".to_string()));
/// assert_eq!(msg.kind(), MessageKind::RuntimeError);
/// assert_eq!(msg.text(), "Division by zero");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A log line.
    Log {
        /// Message text.
        text: String,
    },
    /// A debug line.
    Debug {
        /// Message text.
        text: String,
    },
    /// A runtime error with an optional stack trace.
    RuntimeError {
        /// Error message.
        text: String,
        /// Stack trace captured at the failure site.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack_trace: Option<String>,
    },
    /// A host error with an optional stack trace.
    Error {
        /// Error message.
        text: String,
        /// Stack trace captured at the failure site.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack_trace: Option<String>,
    },
    /// A message of a kind this version does not understand.
    Other {
        /// Producer-defined kind tag.
        kind: String,
        /// Opaque payload.
        text: String,
    },
}

impl Message {
    /// Creates a log message.
    #[must_use]
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log { text: text.into() }
    }

    /// Creates a debug message.
    #[must_use]
    pub fn debug(text: impl Into<String>) -> Self {
        Self::Debug { text: text.into() }
    }

    /// Creates a runtime error message.
    #[must_use]
    pub fn runtime_error(text: impl Into<String>, stack_trace: Option<String>) -> Self {
        Self::RuntimeError {
            text: text.into(),
            stack_trace,
        }
    }

    /// Creates a host error message.
    #[must_use]
    pub fn error(text: impl Into<String>, stack_trace: Option<String>) -> Self {
        Self::Error {
            text: text.into(),
            stack_trace,
        }
    }

    /// Creates a message of an unknown kind.
    #[must_use]
    pub fn other(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Other {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// Returns the kind tag of this message.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Log { .. } => MessageKind::Log,
            Self::Debug { .. } => MessageKind::Debug,
            Self::RuntimeError { .. } => MessageKind::RuntimeError,
            Self::Error { .. } => MessageKind::Error,
            Self::Other { .. } => MessageKind::Other,
        }
    }

    /// Returns the free-text payload.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Log { text }
            | Self::Debug { text }
            | Self::RuntimeError { text, .. }
            | Self::Error { text, .. }
            | Self::Other { text, .. } => text,
        }
    }

    /// Returns the stack trace for error kinds.
    #[must_use]
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::RuntimeError { stack_trace, .. } | Self::Error { stack_trace, .. } => {
                stack_trace.as_deref()
            }
            _ => None,
        }
    }

    /// Returns true for the error kinds.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::RuntimeError { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(Message::log("a").kind(), MessageKind::Log);
        assert_eq!(Message::debug("a").kind(), MessageKind::Debug);
        assert_eq!(Message::error("a", None).kind(), MessageKind::Error);
        assert_eq!(Message::other("chart", "a").kind(), MessageKind::Other);
    }

    #[test]
    fn test_stack_trace_only_on_errors() {
        let err = Message::error("boom", Some("frame 1".to_string()));
        assert_eq!(err.stack_trace(), Some("frame 1"));
        assert!(err.is_error());

        let log = Message::log("hello");
        assert_eq!(log.stack_trace(), None);
        assert!(!log.is_error());
    }

    #[test]
    fn test_message_serialization_is_tagged() {
        let msg = Message::runtime_error("boom", None);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "runtime_error");
        assert_eq!(json["text"], "boom");
        assert!(json.get("stack_trace").is_none());

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MessageKind::RuntimeError.to_string(), "runtime_error");
        assert_eq!(MessageKind::Log.to_string(), "log");
    }
}
