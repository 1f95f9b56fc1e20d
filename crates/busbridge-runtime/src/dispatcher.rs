//! Message Dispatcher
//!
//! Forwards outbound payloads from the UI boundary to the running
//! publisher task. `send` never blocks: the state check reads the
//! controller's state watch and the enqueue is a `try_send` on the
//! bounded outbound channel. Delivery is best-effort — messages still
//! queued when the publisher stops are dropped with it.

use std::sync::Arc;

use busbridge_core::{
    BridgeResult, ChannelError, DispatchError, NonBlockingSend, OutboundMessage,
};
use tracing::debug;

use crate::controller::EndpointController;

pub struct MessageDispatcher {
    controller: Arc<EndpointController>,
}

impl MessageDispatcher {
    pub fn new(controller: Arc<EndpointController>) -> Self {
        Self { controller }
    }

    /// Enqueue one message for the publisher task
    ///
    /// Fails with `NoActivePublisher` unless the publisher is Running,
    /// and with `QueueFull` when the outbound buffer has no room;
    /// nothing is enqueued in either case.
    pub fn send(&self, message: OutboundMessage) -> BridgeResult<()> {
        let sender = self.controller.outbound_sender()?;

        sender.try_send_non_blocking(message).map_err(|e| -> busbridge_core::BridgeError { match e {
            ChannelError::ChannelFull => DispatchError::QueueFull {
                capacity: self.controller.config().channels.outbound_buffer_size,
            }
            .into(),
            // The task dropped its receiver; it is as good as stopped.
            ChannelError::ChannelClosed => DispatchError::NoActivePublisher.into(),
        }})?;

        debug!("outbound message enqueued");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
