//! Endpoint Controller
//!
//! Owns at most one active publisher task and one active subscriber
//! task, serializes start/stop transitions per endpoint kind, and
//! supervises every spawned task through a completion channel so no
//! exit goes unobserved.

use busbridge_core::{
    create_completion_channel, create_inbound_channel, create_outbound_channel,
    create_ready_channel, create_state_channel, create_stop_channel, BridgeConfig, BridgeError,
    BridgeResult, ControlError, DispatchError, EndpointChannels, EndpointKind, EndpointState,
    EndpointTaskFactory, InboundSender, OutboundSender, StateReceiver, StateSender, StopSender,
};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::{sync::Mutex, task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};

use crate::sink::{InboundHandler, InboundSink};

// ----------------------------------------------------------------------------
// Endpoint Slot
// ----------------------------------------------------------------------------

/// Handles held for one running endpoint task
struct ActiveEndpoint {
    stop: StopSender,
    /// Clone source for the dispatcher; publisher slots only
    outbound: Option<OutboundSender>,
    task_handle: JoinHandle<()>,
}

/// Per-kind slot: the transition lock orders start/stop, the state
/// watch publishes the current state to readers that must not contend
/// with in-flight transitions (dispatcher, stop waiters).
struct EndpointSlot {
    kind: EndpointKind,
    transition: Mutex<()>,
    state: StateSender,
    active: StdMutex<Option<ActiveEndpoint>>,
}

impl EndpointSlot {
    fn new(kind: EndpointKind) -> Arc<Self> {
        let (state, _) = create_state_channel();
        Arc::new(Self {
            kind,
            transition: Mutex::new(()),
            state,
            active: StdMutex::new(None),
        })
    }

    fn current_state(&self) -> EndpointState {
        *self.state.borrow()
    }

    /// Clear the slot after the task has exited. Called with the
    /// transition lock held.
    fn finalize(&self) {
        self.active
            .lock()
            .expect("endpoint slot lock poisoned")
            .take();
        self.state.send_replace(EndpointState::Stopped);
    }
}

// ----------------------------------------------------------------------------
// Endpoint Controller
// ----------------------------------------------------------------------------

/// Lifecycle manager for the publisher and subscriber endpoints
///
/// The controller is the only writer of endpoint state. The task
/// factory and the inbound handler are supplied at construction; there
/// is no ambient global state. Construction spawns the inbound sink
/// loop, so it must happen inside a tokio runtime.
pub struct EndpointController {
    config: BridgeConfig,
    factory: Box<dyn EndpointTaskFactory>,
    publisher: Arc<EndpointSlot>,
    subscriber: Arc<EndpointSlot>,
    /// Clone source handed to each spawned subscriber task
    inbound_sender: InboundSender,
    sink: InboundSink,
}

impl EndpointController {
    /// Create a controller and spawn its inbound sink loop
    pub fn new(
        config: BridgeConfig,
        factory: Box<dyn EndpointTaskFactory>,
        handler: Box<dyn InboundHandler>,
    ) -> BridgeResult<Self> {
        config.validate().map_err(BridgeError::config_error)?;

        let (inbound_sender, inbound_receiver) = create_inbound_channel(&config.channels);
        let sink = InboundSink::spawn(handler, inbound_receiver);

        Ok(Self {
            config,
            factory,
            publisher: EndpointSlot::new(EndpointKind::Publisher),
            subscriber: EndpointSlot::new(EndpointKind::Subscriber),
            inbound_sender,
            sink,
        })
    }

    fn slot(&self, kind: EndpointKind) -> &Arc<EndpointSlot> {
        match kind {
            EndpointKind::Publisher => &self.publisher,
            EndpointKind::Subscriber => &self.subscriber,
        }
    }

    /// Start the endpoint of the given kind
    ///
    /// Returns `Ok(true)` if a task was spawned and confirmed Running,
    /// `Ok(false)` if the endpoint was not Stopped (idempotent no-op),
    /// and an error if the spawn failed — in which case the endpoint is
    /// back in Stopped.
    pub async fn start(&self, kind: EndpointKind) -> BridgeResult<bool> {
        let slot = self.slot(kind);
        let _guard = slot.transition.lock().await;

        let current = slot.current_state();
        if current != EndpointState::Stopped {
            debug!(%kind, state = %current, "start ignored: endpoint not stopped");
            return Ok(false);
        }

        slot.state.send_replace(EndpointState::Starting);

        match self.spawn_endpoint(slot, kind).await {
            Ok(active) => {
                *slot
                    .active
                    .lock()
                    .expect("endpoint slot lock poisoned") = Some(active);
                slot.state.send_replace(EndpointState::Running);
                info!(%kind, "endpoint running");
                Ok(true)
            }
            Err(e) => {
                slot.state.send_replace(EndpointState::Stopped);
                warn!(%kind, error = %e, "endpoint start failed");
                Err(e)
            }
        }
    }

    /// Stop the endpoint of the given kind
    ///
    /// Cooperative: signals the task and waits for its observed exit.
    /// Returns `Ok(true)` once the endpoint reached Stopped, `Ok(false)`
    /// if it already was Stopped (idempotent no-op).
    pub async fn stop(&self, kind: EndpointKind) -> BridgeResult<bool> {
        let slot = self.slot(kind);
        let guard = slot.transition.lock().await;

        match slot.current_state() {
            EndpointState::Stopped => return Ok(false),
            EndpointState::Stopping => {
                // Another stop is in flight; wait alongside it.
            }
            EndpointState::Starting | EndpointState::Running => {
                slot.state.send_replace(EndpointState::Stopping);
                if let Some(active) = slot
                    .active
                    .lock()
                    .expect("endpoint slot lock poisoned")
                    .as_ref()
                {
                    // Advisory signal; a task that already exited has
                    // dropped its receiver and the send is a no-op.
                    let _ = active.stop.send(true);
                }
                info!(%kind, "stop signalled");
            }
        }

        // Release the transition lock so the supervisor can finalize the
        // slot, then wait for the Stopped transition it publishes.
        drop(guard);

        let mut state_rx = slot.state.subscribe();
        while *state_rx.borrow_and_update() != EndpointState::Stopped {
            state_rx
                .changed()
                .await
                .map_err(|_| BridgeError::channel_error("endpoint state channel closed"))?;
        }

        info!(%kind, "endpoint stopped");
        Ok(true)
    }

    /// Stop both endpoints; used by embedders on teardown
    pub async fn shutdown(&self) -> BridgeResult<()> {
        for kind in EndpointKind::ALL {
            self.stop(kind).await?;
        }
        Ok(())
    }

    /// Current state of the endpoint of the given kind
    pub fn state(&self, kind: EndpointKind) -> EndpointState {
        self.slot(kind).current_state()
    }

    /// Subscribe to state changes of the endpoint of the given kind
    pub fn watch_state(&self, kind: EndpointKind) -> StateReceiver {
        self.slot(kind).state.subscribe()
    }

    pub fn is_running(&self, kind: EndpointKind) -> bool {
        self.state(kind) == EndpointState::Running
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Outbound sender of the running publisher task
    ///
    /// This is the dispatcher's gate: it fails with `NoActivePublisher`
    /// until the publisher has confirmed Running, without touching the
    /// transition lock.
    pub(crate) fn outbound_sender(&self) -> BridgeResult<OutboundSender> {
        let slot = &self.publisher;
        if slot.current_state() != EndpointState::Running {
            return Err(DispatchError::NoActivePublisher.into());
        }
        slot.active
            .lock()
            .expect("endpoint slot lock poisoned")
            .as_ref()
            .and_then(|active| active.outbound.clone())
            .ok_or_else(|| DispatchError::NoActivePublisher.into())
    }

    /// Wire channels into a fresh task, spawn it, and wait for its
    /// readiness confirmation. Called with the transition lock held.
    async fn spawn_endpoint(
        &self,
        slot: &Arc<EndpointSlot>,
        kind: EndpointKind,
    ) -> BridgeResult<ActiveEndpoint> {
        let mut task = self.factory.create(kind)?;

        let (ready_tx, ready_rx) = create_ready_channel();
        let (stop_tx, stop_rx) = create_stop_channel();
        let (done_tx, done_rx) = create_completion_channel();

        let mut outbound = None;
        let channels = match kind {
            EndpointKind::Publisher => {
                let (tx, rx) = create_outbound_channel(&self.config.channels);
                outbound = Some(tx);
                EndpointChannels::for_publisher(ready_tx, stop_rx, rx)
            }
            EndpointKind::Subscriber => {
                EndpointChannels::for_subscriber(ready_tx, stop_rx, self.inbound_sender.clone())
            }
        };

        task.attach_channels(channels)
            .map_err(|e| BridgeError::spawn_failed(kind, e.to_string()))?;

        debug!(%kind, "spawning endpoint task");
        let task_handle = tokio::spawn(async move {
            let result = task.run().await;
            let _ = done_tx.send(result);
        });

        // A task that never confirms was never Running, so the
        // no-force-kill rule for stop() does not cover it; abort the
        // spawn attempt instead of leaking a half-started task.
        let confirm_timeout = self.config.controller.confirm_timeout;
        match timeout(confirm_timeout, ready_rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                task_handle.abort();
                return Err(BridgeError::spawn_failed(
                    kind,
                    "task exited before confirming readiness",
                ));
            }
            Err(_) => {
                task_handle.abort();
                return Err(BridgeError::Control(ControlError::ConfirmationTimeout {
                    kind,
                    timeout_ms: confirm_timeout.as_millis() as u64,
                }));
            }
        }

        // Supervise the confirmed task: observe its exit (solicited or
        // not) and reset the slot to Stopped.
        let monitor_slot = Arc::clone(slot);
        tokio::spawn(async move {
            match done_rx.await {
                Ok(Ok(())) => debug!(kind = %monitor_slot.kind, "endpoint task finished"),
                Ok(Err(e)) => {
                    warn!(kind = %monitor_slot.kind, error = %e, "endpoint task failed")
                }
                Err(_) => {
                    // The wrapper was aborted or panicked before sending.
                    warn!(kind = %monitor_slot.kind, "endpoint task ended without a result")
                }
            }
            let _guard = monitor_slot.transition.lock().await;
            monitor_slot.finalize();
        });

        Ok(ActiveEndpoint {
            stop: stop_tx,
            outbound,
            task_handle,
        })
    }
}

impl Drop for EndpointController {
    fn drop(&mut self) {
        // Teardown, not a cooperative stop: abort whatever is left.
        for slot in [&self.publisher, &self.subscriber] {
            if let Ok(mut active) = slot.active.lock() {
                if let Some(active) = active.take() {
                    active.task_handle.abort();
                }
            }
        }
        self.sink.abort();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
