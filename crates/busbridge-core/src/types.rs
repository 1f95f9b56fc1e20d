//! Endpoint and message types shared across the bridge
//!
//! These are the only types that cross the UI boundary, the controller
//! and the external pub/sub tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

// ----------------------------------------------------------------------------
// Endpoint Identity
// ----------------------------------------------------------------------------

/// The two endpoint roles a pub/sub session can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    Publisher,
    Subscriber,
}

impl EndpointKind {
    /// All endpoint kinds, in controller slot order
    pub const ALL: [EndpointKind; 2] = [EndpointKind::Publisher, EndpointKind::Subscriber];
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Publisher => write!(f, "publisher"),
            EndpointKind::Subscriber => write!(f, "subscriber"),
        }
    }
}

// ----------------------------------------------------------------------------
// Endpoint State
// ----------------------------------------------------------------------------

/// Lifecycle state of a single endpoint kind
///
/// Transitions happen only inside the controller and are totally ordered
/// per kind: `Stopped → Starting → Running → Stopping → Stopped`, with
/// `Starting → Stopped` on spawn failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndpointState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointState::Stopped => write!(f, "Stopped"),
            EndpointState::Starting => write!(f, "Starting"),
            EndpointState::Running => write!(f, "Running"),
            EndpointState::Stopping => write!(f, "Stopping"),
        }
    }
}

// ----------------------------------------------------------------------------
// Messages
// ----------------------------------------------------------------------------

/// An owned text payload headed for the publisher task
///
/// Created at the UI boundary (after argument validation) and consumed
/// exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    payload: String,
}

impl OutboundMessage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

/// An owned text payload produced by the subscriber task
///
/// Consumed exactly once by the inbound sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    payload: String,
}

impl InboundMessage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
