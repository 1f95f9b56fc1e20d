//! Busbridge Core
//!
//! Boundary-facing types for the busbridge endpoint lifecycle manager:
//! endpoint and message types, configuration, typed channel plumbing,
//! the error taxonomy, and the [`EndpointTask`] trait that abstracts
//! the external pub/sub library. The engine that drives these lives in
//! `busbridge-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod config;
pub mod endpoint_task;
pub mod errors;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{
    create_completion_channel, create_inbound_channel, create_outbound_channel,
    create_ready_channel, create_state_channel, create_stop_channel, ChannelError,
    CompletionReceiver, CompletionSender, InboundReceiver, InboundSender, NonBlockingSend,
    OutboundReceiver, OutboundSender, ReadyReceiver, ReadySender, StateReceiver, StateSender,
    StopReceiver, StopSender,
};
pub use config::{BridgeConfig, ChannelConfig, ControllerConfig};
pub use endpoint_task::{EndpointChannels, EndpointTask, EndpointTaskFactory};
pub use errors::{
    BoundaryError, BridgeError, BridgeResult, ControlError, DispatchError, HandlerFailure, Result,
};
pub use types::{EndpointKind, EndpointState, InboundMessage, OutboundMessage};
