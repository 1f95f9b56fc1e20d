//! Endpoint Task Trait Definition
//!
//! Defines the common interface to the external pub/sub library.
//! Concrete implementations wrap that library's publisher and
//! subscriber; the controller only sees this trait.

use crate::channel::{
    InboundSender, OutboundReceiver, ReadySender, StopReceiver,
};
use crate::errors::BridgeResult;
use crate::types::EndpointKind;

// ----------------------------------------------------------------------------
// Endpoint Channels
// ----------------------------------------------------------------------------

/// Channel handles the controller wires into a task before spawning it
///
/// `outbound` is present for publisher tasks, `inbound` for subscriber
/// tasks. `ready` must be signalled exactly once, when the task has
/// finished initializing and can do useful work; until then the
/// controller keeps the endpoint in `Starting`.
pub struct EndpointChannels {
    pub ready: ReadySender,
    pub stop: StopReceiver,
    pub outbound: Option<OutboundReceiver>,
    pub inbound: Option<InboundSender>,
}

impl EndpointChannels {
    /// Channel set for a publisher task
    pub fn for_publisher(
        ready: ReadySender,
        stop: StopReceiver,
        outbound: OutboundReceiver,
    ) -> Self {
        Self {
            ready,
            stop,
            outbound: Some(outbound),
            inbound: None,
        }
    }

    /// Channel set for a subscriber task
    pub fn for_subscriber(
        ready: ReadySender,
        stop: StopReceiver,
        inbound: InboundSender,
    ) -> Self {
        Self {
            ready,
            stop,
            outbound: None,
            inbound: Some(inbound),
        }
    }
}

// ----------------------------------------------------------------------------
// Endpoint Task Trait
// ----------------------------------------------------------------------------

/// Common interface for externally-provided endpoint tasks
///
/// Endpoint tasks are independent async tasks that drive the external
/// pub/sub library. Each task:
/// - runs its own event loop via `run()`
/// - signals readiness on the attached `ready` channel once initialized
/// - watches the attached `stop` channel and exits cooperatively
/// - publisher tasks drain the `outbound` receiver; subscriber tasks
///   push onto the `inbound` sender in production order
/// - holds no shared state with the controller; its lifecycle
///   (spawning, completion observation) belongs to the controller
#[async_trait::async_trait]
pub trait EndpointTask: Send {
    /// Attach the channels created by the controller
    ///
    /// Implementations must store these handles and use them for all
    /// communication; calling `run()` without attached channels is a
    /// spawn failure.
    fn attach_channels(&mut self, channels: EndpointChannels) -> BridgeResult<()>;

    /// Run the task's main loop until stopped
    ///
    /// The future should resolve after the stop signal is observed and
    /// cleanup is done. An `Err` return is reported through the
    /// controller's supervision path.
    async fn run(&mut self) -> BridgeResult<()>;

    /// Which endpoint role this task fills
    fn kind(&self) -> EndpointKind;
}

// ----------------------------------------------------------------------------
// Endpoint Task Factory
// ----------------------------------------------------------------------------

/// Factory for endpoint tasks
///
/// The controller creates a fresh task on every start so an endpoint
/// can be stopped and started again; a factory failure is reported as
/// `SpawnFailed`.
pub trait EndpointTaskFactory: Send + Sync {
    fn create(&self, kind: EndpointKind) -> BridgeResult<Box<dyn EndpointTask>>;
}
