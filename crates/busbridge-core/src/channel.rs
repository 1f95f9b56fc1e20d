//! Channel plumbing for inter-task communication
//!
//! All communication between the boundary, the controller and the
//! external endpoint tasks flows through these typed tokio channels:
//! - outbound: dispatcher → publisher task (bounded mpsc)
//! - inbound: subscriber task → sink (bounded mpsc)
//! - ready: task → controller, one-shot readiness confirmation
//! - stop: controller → task, cooperative shutdown signal (watch)
//! - completion: task wrapper → supervisor, one-shot exit result
//! - state: controller → observers, current endpoint state (watch)

use crate::config::ChannelConfig;
use crate::errors::BridgeResult;
use crate::types::{EndpointState, InboundMessage, OutboundMessage};
use std::fmt;

// ----------------------------------------------------------------------------
// Channel Type Aliases
// ----------------------------------------------------------------------------

pub type OutboundSender = tokio::sync::mpsc::Sender<OutboundMessage>;
pub type OutboundReceiver = tokio::sync::mpsc::Receiver<OutboundMessage>;
pub type InboundSender = tokio::sync::mpsc::Sender<InboundMessage>;
pub type InboundReceiver = tokio::sync::mpsc::Receiver<InboundMessage>;
pub type ReadySender = tokio::sync::oneshot::Sender<()>;
pub type ReadyReceiver = tokio::sync::oneshot::Receiver<()>;
pub type StopSender = tokio::sync::watch::Sender<bool>;
pub type StopReceiver = tokio::sync::watch::Receiver<bool>;
pub type CompletionSender = tokio::sync::oneshot::Sender<BridgeResult<()>>;
pub type CompletionReceiver = tokio::sync::oneshot::Receiver<BridgeResult<()>>;
pub type StateSender = tokio::sync::watch::Sender<EndpointState>;
pub type StateReceiver = tokio::sync::watch::Receiver<EndpointState>;

// ----------------------------------------------------------------------------
// Channel Errors
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub enum ChannelError {
    ChannelFull,
    ChannelClosed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::ChannelFull => write!(f, "channel buffer is full"),
            ChannelError::ChannelClosed => write!(f, "channel is closed"),
        }
    }
}

impl std::error::Error for ChannelError {}

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create the bounded outbound channel (dispatcher → publisher task)
pub fn create_outbound_channel(config: &ChannelConfig) -> (OutboundSender, OutboundReceiver) {
    tokio::sync::mpsc::channel(config.outbound_buffer_size)
}

/// Create the bounded inbound channel (subscriber task → sink)
pub fn create_inbound_channel(config: &ChannelConfig) -> (InboundSender, InboundReceiver) {
    tokio::sync::mpsc::channel(config.inbound_buffer_size)
}

/// Create a one-shot readiness confirmation channel (task → controller)
pub fn create_ready_channel() -> (ReadySender, ReadyReceiver) {
    tokio::sync::oneshot::channel()
}

/// Create a cooperative stop signal channel (controller → task)
///
/// The receiver starts at `false`; the controller flips it to `true`
/// exactly once.
pub fn create_stop_channel() -> (StopSender, StopReceiver) {
    tokio::sync::watch::channel(false)
}

/// Create a one-shot completion channel carrying the task's exit result
pub fn create_completion_channel() -> (CompletionSender, CompletionReceiver) {
    tokio::sync::oneshot::channel()
}

/// Create a state watch channel, initialized to `Stopped`
pub fn create_state_channel() -> (StateSender, StateReceiver) {
    tokio::sync::watch::channel(EndpointState::Stopped)
}

// ----------------------------------------------------------------------------
// Non-blocking Send Utilities
// ----------------------------------------------------------------------------

/// Non-blocking send so boundary callers never wait on channel capacity
pub trait NonBlockingSend<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError>;
}

impl NonBlockingSend<OutboundMessage> for OutboundSender {
    fn try_send_non_blocking(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        self.try_send(message).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }
}

impl NonBlockingSend<InboundMessage> for InboundSender {
    fn try_send_non_blocking(&self, message: InboundMessage) -> Result<(), ChannelError> {
        self.try_send(message).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbound_channel_creation() {
        let config = ChannelConfig::default();
        let (sender, mut receiver) = create_outbound_channel(&config);

        sender.send(OutboundMessage::new("hello")).await.unwrap();
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.payload(), "hello");
    }

    #[tokio::test]
    async fn test_non_blocking_send_reports_full() {
        let config = ChannelConfig {
            outbound_buffer_size: 1,
            inbound_buffer_size: 1,
        };
        let (sender, _receiver) = create_outbound_channel(&config);

        sender
            .try_send_non_blocking(OutboundMessage::new("first"))
            .unwrap();
        let err = sender
            .try_send_non_blocking(OutboundMessage::new("second"))
            .unwrap_err();
        assert!(matches!(err, ChannelError::ChannelFull));
    }

    #[tokio::test]
    async fn test_non_blocking_send_reports_closed() {
        let config = ChannelConfig::testing();
        let (sender, receiver) = create_outbound_channel(&config);
        drop(receiver);

        let err = sender
            .try_send_non_blocking(OutboundMessage::new("late"))
            .unwrap_err();
        assert!(matches!(err, ChannelError::ChannelClosed));
    }

    #[test]
    fn test_state_channel_starts_stopped() {
        let (_tx, rx) = create_state_channel();
        assert_eq!(*rx.borrow(), EndpointState::Stopped);
    }
}
