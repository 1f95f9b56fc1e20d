//! Busbridge Runtime Engine
//!
//! The engine of the bridge between a UI boundary and an external
//! pub/sub data bus:
//! - [`EndpointController`]: owns and supervises the publisher and
//!   subscriber tasks
//! - [`MessageDispatcher`]: non-blocking outbound path to the publisher
//! - [`InboundSink`]: ordered delivery of inbound messages to the
//!   registered handler
//! - [`BridgeHandle`]: the boundary adapter the UI layer calls
//!
//! `busbridge-core` provides the stable type definitions; this crate
//! provides the behavior.

pub mod bridge;
pub mod controller;
pub mod dispatcher;
pub mod sink;
pub mod testing;

pub use bridge::BridgeHandle;
pub use controller::EndpointController;
pub use dispatcher::MessageDispatcher;
pub use sink::{InboundHandler, InboundSink};

// Re-export core types for convenience
pub use busbridge_core::{
    BoundaryError, BridgeConfig, BridgeError, BridgeResult, ChannelConfig, ControlError,
    ControllerConfig, DispatchError, EndpointChannels, EndpointKind, EndpointState, EndpointTask,
    EndpointTaskFactory, HandlerFailure, InboundMessage, OutboundMessage,
};
