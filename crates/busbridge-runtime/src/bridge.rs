//! UI Boundary Handle
//!
//! The thin adapter the UI layer talks to. Control operations are
//! dispatched onto the runtime and return immediately; their outcomes
//! are observed and logged instead of being detached and forgotten.
//! `send_message` validates the raw argument, then hands the payload to
//! the dispatcher without blocking.

use std::sync::Arc;

use busbridge_core::{
    BoundaryError, BridgeConfig, BridgeResult, EndpointKind, EndpointState, EndpointTaskFactory,
    OutboundMessage, StateReceiver,
};
use tracing::{info, warn};

use crate::controller::EndpointController;
use crate::dispatcher::MessageDispatcher;
use crate::sink::InboundHandler;

// ----------------------------------------------------------------------------
// Bridge Handle
// ----------------------------------------------------------------------------

/// Handle exposing the boundary operations to the UI layer
///
/// Cheap to clone; all clones drive the same controller.
#[derive(Clone)]
pub struct BridgeHandle {
    controller: Arc<EndpointController>,
    dispatcher: Arc<MessageDispatcher>,
}

impl BridgeHandle {
    /// Build a bridge from a config, a task factory for the external
    /// pub/sub library, and the inbound message handler.
    ///
    /// Must be called inside a tokio runtime (the inbound sink loop is
    /// spawned here).
    pub fn new(
        config: BridgeConfig,
        factory: Box<dyn EndpointTaskFactory>,
        handler: Box<dyn InboundHandler>,
    ) -> BridgeResult<Self> {
        let controller = Arc::new(EndpointController::new(config, factory, handler)?);
        let dispatcher = Arc::new(MessageDispatcher::new(Arc::clone(&controller)));
        info!("bridge handle created");
        Ok(Self {
            controller,
            dispatcher,
        })
    }

    /// Start the publisher endpoint; returns immediately
    pub fn start_publisher(&self) -> bool {
        self.spawn_control(EndpointKind::Publisher, ControlOp::Start);
        true
    }

    /// Stop the publisher endpoint; returns immediately
    pub fn stop_publisher(&self) -> bool {
        self.spawn_control(EndpointKind::Publisher, ControlOp::Stop);
        true
    }

    /// Start the subscriber endpoint; returns immediately
    pub fn start_subscriber(&self) -> bool {
        self.spawn_control(EndpointKind::Subscriber, ControlOp::Start);
        true
    }

    /// Stop the subscriber endpoint; returns immediately
    pub fn stop_subscriber(&self) -> bool {
        self.spawn_control(EndpointKind::Subscriber, ControlOp::Stop);
        true
    }

    /// Validate and enqueue one outbound message
    ///
    /// `None` is `NoArgument`; empty or over-length payloads are
    /// `InvalidArgument`; a publisher that is not Running is
    /// `NoActivePublisher`. Never blocks.
    pub fn send_message(&self, payload: Option<&str>) -> BridgeResult<()> {
        let payload = payload.ok_or(BoundaryError::NoArgument)?;
        let message = self.validate_payload(payload)?;
        self.dispatcher.send(message)
    }

    /// Current state of one endpoint
    pub fn endpoint_state(&self, kind: EndpointKind) -> EndpointState {
        self.controller.state(kind)
    }

    /// Subscribe to state changes of one endpoint
    pub fn watch_endpoint(&self, kind: EndpointKind) -> StateReceiver {
        self.controller.watch_state(kind)
    }

    /// Stop both endpoints and wait for them; for embedder teardown
    pub async fn shutdown(&self) -> BridgeResult<()> {
        info!("bridge shutting down");
        self.controller.shutdown().await
    }

    /// The controller, for embedders that need awaitable start/stop
    pub fn controller(&self) -> &Arc<EndpointController> {
        &self.controller
    }

    fn validate_payload(&self, payload: &str) -> BridgeResult<OutboundMessage> {
        if payload.is_empty() {
            return Err(BoundaryError::InvalidArgument {
                reason: "payload is empty".to_string(),
            }
            .into());
        }
        let max = self.controller.config().controller.max_payload_bytes;
        if payload.len() > max {
            return Err(BoundaryError::InvalidArgument {
                reason: format!("payload is {} bytes, limit is {}", payload.len(), max),
            }
            .into());
        }
        Ok(OutboundMessage::new(payload))
    }

    fn spawn_control(&self, kind: EndpointKind, op: ControlOp) {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let result = match op {
                ControlOp::Start => controller.start(kind).await,
                ControlOp::Stop => controller.stop(kind).await,
            };
            if let Err(e) = result {
                warn!(%kind, operation = op.name(), error = %e, "control operation failed");
            }
        });
    }
}

#[derive(Clone, Copy)]
enum ControlOp {
    Start,
    Stop,
}

impl ControlOp {
    fn name(self) -> &'static str {
        match self {
            ControlOp::Start => "start",
            ControlOp::Stop => "stop",
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
