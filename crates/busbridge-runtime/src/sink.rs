//! Inbound Callback Sink
//!
//! Receives messages from the subscriber task and forwards them, in
//! production order, to the single handler registered at controller
//! construction. Handler failures are logged and isolated; neither the
//! sink loop nor the subscriber task stops because of them.

use busbridge_core::{HandlerFailure, InboundMessage, InboundReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// ----------------------------------------------------------------------------
// Inbound Handler
// ----------------------------------------------------------------------------

/// The callback invoked once per inbound message
///
/// Runs on the sink's own task, never on the task that produced the
/// message. Returning an error drops the message and nothing else.
pub trait InboundHandler: Send + Sync {
    fn handle(&self, message: InboundMessage) -> Result<(), HandlerFailure>;
}

impl<F> InboundHandler for F
where
    F: Fn(InboundMessage) -> Result<(), HandlerFailure> + Send + Sync,
{
    fn handle(&self, message: InboundMessage) -> Result<(), HandlerFailure> {
        self(message)
    }
}

// ----------------------------------------------------------------------------
// Inbound Sink
// ----------------------------------------------------------------------------

/// The sink loop task handle
///
/// The loop lives for the controller's lifetime; subscriber tasks come
/// and go, each holding a clone of the inbound sender. A single mpsc
/// receiver preserves delivery order.
pub struct InboundSink {
    handle: JoinHandle<()>,
}

impl InboundSink {
    /// Spawn the delivery loop. Must be called inside a tokio runtime.
    pub fn spawn(handler: Box<dyn InboundHandler>, mut receiver: InboundReceiver) -> Self {
        let handle = tokio::spawn(async move {
            debug!("inbound sink started");
            while let Some(message) = receiver.recv().await {
                if let Err(e) = handler.handle(message) {
                    warn!(error = %e, "inbound handler failed; message dropped");
                }
            }
            debug!("inbound sink stopped");
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
