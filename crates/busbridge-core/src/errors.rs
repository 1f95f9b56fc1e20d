//! Error types for the busbridge endpoint lifecycle manager
//!
//! Layered error taxonomy: specific error enums per concern (boundary,
//! dispatch, control, sink) unified under [`BridgeError`]. No condition
//! here is fatal to the process; everything is recoverable at the
//! boundary.

use crate::types::EndpointKind;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Errors raised while validating arguments at the UI boundary
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("no argument: expected a string payload")]
    NoArgument,
}

/// Errors raised while dispatching an outbound message
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no active publisher: endpoint is not running")]
    NoActivePublisher,
    #[error("outbound queue full (capacity: {capacity})")]
    QueueFull { capacity: usize },
}

/// Errors raised by endpoint lifecycle control
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("{kind} task could not be spawned: {reason}")]
    SpawnFailed {
        kind: EndpointKind,
        reason: String,
    },
    #[error("{kind} task did not confirm readiness within {timeout_ms}ms")]
    ConfirmationTimeout {
        kind: EndpointKind,
        timeout_ms: u64,
    },
}

/// Errors raised inside the inbound sink
///
/// These are isolated by the sink loop (logged, never propagated to the
/// subscriber task); the type exists so handlers have a concrete error
/// to return.
#[derive(Debug, thiserror::Error)]
#[error("inbound handler failed: {reason}")]
pub struct HandlerFailure {
    pub reason: String,
}

impl HandlerFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Top-level error type for the bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("boundary error: {0}")]
    Boundary(#[from] BoundaryError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("control error: {0}")]
    Control(#[from] ControlError),

    #[error("handler error: {0}")]
    Handler(#[from] HandlerFailure),

    /// Internal channel breakage (a task or the controller went away)
    #[error("channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl BridgeError {
    /// Create an invalid-argument boundary error
    pub fn invalid_argument<T: Into<String>>(reason: T) -> Self {
        BridgeError::Boundary(BoundaryError::InvalidArgument {
            reason: reason.into(),
        })
    }

    /// Create a spawn-failed control error
    pub fn spawn_failed<R: Into<String>>(kind: EndpointKind, reason: R) -> Self {
        BridgeError::Control(ControlError::SpawnFailed {
            kind,
            reason: reason.into(),
        })
    }

    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        BridgeError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        BridgeError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the error should be surfaced to the boundary caller
    /// (everything except isolated handler failures)
    pub fn is_caller_visible(&self) -> bool {
        !matches!(self, BridgeError::Handler(_))
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, BridgeError>;
pub type BridgeResult<T> = Result<T>;

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
