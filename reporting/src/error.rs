//! Errors surfaced by the result handler.
//!
//! Only construction and lifecycle misuse fail; sampling and logging never do.

use crate::config::ConfigError;
use crate::policy::RunDescriptorError;
use thiserror::Error;

/// Errors that can occur while building or starting a result handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The run descriptor is malformed.
    #[error("Invalid run descriptor: {0}")]
    RunDescriptor(#[from] RunDescriptorError),

    /// The configuration is invalid.
    #[error("Invalid handler configuration: {0}")]
    Config(#[from] ConfigError),

    /// `start` was called on a handler that was already started.
    #[error("Result handler was already started")]
    AlreadyStarted,

    /// The consumer thread could not be created.
    #[error("Failed to spawn consumer thread: {0}")]
    Spawn(#[source] std::io::Error),
}
