//! Stub endpoint tasks for tests
//!
//! `StubFactory` produces in-memory `EndpointTask` implementations that
//! behave like a well-mannered external pub/sub library: they confirm
//! readiness, drain the outbound queue, emit injected inbound messages
//! in order, and exit on the cooperative stop signal. Knobs exist for
//! the unfriendly cases (slow or missing readiness confirmation,
//! factory failure, unsolicited exit).

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use busbridge_core::{
    BridgeError, BridgeResult, EndpointChannels, EndpointKind, EndpointTask, EndpointTaskFactory,
    InboundMessage,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

fn kind_index(kind: EndpointKind) -> usize {
    match kind {
        EndpointKind::Publisher => 0,
        EndpointKind::Subscriber => 1,
    }
}

// ----------------------------------------------------------------------------
// Shared Observation State
// ----------------------------------------------------------------------------

/// Counters and captures shared between a factory, its tasks and a test
pub struct StubShared {
    spawns: [AtomicUsize; 2],
    running: [AtomicUsize; 2],
    max_running: [AtomicUsize; 2],
    transmitted: Mutex<Vec<String>>,
    inject_tx: UnboundedSender<String>,
    inject_rx: Mutex<Option<UnboundedReceiver<String>>>,
}

impl StubShared {
    fn new() -> Arc<Self> {
        let (inject_tx, inject_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            spawns: [AtomicUsize::new(0), AtomicUsize::new(0)],
            running: [AtomicUsize::new(0), AtomicUsize::new(0)],
            max_running: [AtomicUsize::new(0), AtomicUsize::new(0)],
            transmitted: Mutex::new(Vec::new()),
            inject_tx,
            inject_rx: Mutex::new(Some(inject_rx)),
        })
    }

    /// How many tasks of this kind ever began running
    pub fn spawn_count(&self, kind: EndpointKind) -> usize {
        self.spawns[kind_index(kind)].load(Ordering::SeqCst)
    }

    /// How many tasks of this kind are running right now
    pub fn currently_running(&self, kind: EndpointKind) -> usize {
        self.running[kind_index(kind)].load(Ordering::SeqCst)
    }

    /// The highest concurrency ever observed for this kind
    pub fn max_running(&self, kind: EndpointKind) -> usize {
        self.max_running[kind_index(kind)].load(Ordering::SeqCst)
    }

    /// Payloads the publisher stub has taken off the outbound queue
    pub fn transmitted(&self) -> Vec<String> {
        self.transmitted
            .lock()
            .expect("stub transmitted lock poisoned")
            .clone()
    }

    /// Queue a payload for the subscriber stub to deliver inbound
    pub fn emit(&self, payload: impl Into<String>) {
        self.inject_tx
            .send(payload.into())
            .expect("stub inject channel closed");
    }

    /// Poll until at least `count` payloads were transmitted
    pub async fn wait_for_transmitted(&self, count: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.transmitted().len() < count {
            if tokio::time::Instant::now() >= deadline {
                panic!(
                    "timed out waiting for {} transmitted message(s), saw {:?}",
                    count,
                    self.transmitted()
                );
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn take_inject(&self) -> Option<UnboundedReceiver<String>> {
        self.inject_rx
            .lock()
            .expect("stub inject lock poisoned")
            .take()
    }

    fn put_inject(&self, receiver: UnboundedReceiver<String>) {
        *self
            .inject_rx
            .lock()
            .expect("stub inject lock poisoned") = Some(receiver);
    }
}

// ----------------------------------------------------------------------------
// Stub Endpoint Task
// ----------------------------------------------------------------------------

pub struct StubEndpointTask {
    kind: EndpointKind,
    shared: Arc<StubShared>,
    channels: Option<EndpointChannels>,
    ready_delay: Duration,
    confirm_ready: bool,
    exit_after: Option<Duration>,
}

#[async_trait::async_trait]
impl EndpointTask for StubEndpointTask {
    fn attach_channels(&mut self, channels: EndpointChannels) -> BridgeResult<()> {
        if self.channels.is_some() {
            return Err(BridgeError::channel_error("stub channels already attached"));
        }
        self.channels = Some(channels);
        Ok(())
    }

    async fn run(&mut self) -> BridgeResult<()> {
        let channels = self
            .channels
            .take()
            .ok_or_else(|| BridgeError::channel_error("stub task run without channels"))?;

        let idx = kind_index(self.kind);
        self.shared.spawns[idx].fetch_add(1, Ordering::SeqCst);
        let now_running = self.shared.running[idx].fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_running[idx].fetch_max(now_running, Ordering::SeqCst);

        let result = self.event_loop(channels).await;

        self.shared.running[idx].fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn kind(&self) -> EndpointKind {
        self.kind
    }
}

impl StubEndpointTask {
    async fn event_loop(&mut self, channels: EndpointChannels) -> BridgeResult<()> {
        if !self.ready_delay.is_zero() {
            tokio::time::sleep(self.ready_delay).await;
        }
        if !self.confirm_ready {
            // Exit without ever signalling readiness.
            return Ok(());
        }

        let EndpointChannels {
            ready,
            mut stop,
            outbound,
            inbound,
        } = channels;
        let _ = ready.send(());

        let exit_after = self.exit_after;
        let unsolicited_exit = async move {
            match exit_after {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(unsolicited_exit);

        match self.kind {
            EndpointKind::Publisher => {
                let mut outbound = outbound.ok_or_else(|| {
                    BridgeError::channel_error("publisher stub missing outbound receiver")
                })?;
                loop {
                    tokio::select! {
                        changed = stop.changed() => {
                            if changed.is_err() || *stop.borrow() {
                                break;
                            }
                        }
                        message = outbound.recv() => match message {
                            Some(message) => self
                                .shared
                                .transmitted
                                .lock()
                                .expect("stub transmitted lock poisoned")
                                .push(message.into_payload()),
                            None => break,
                        },
                        _ = &mut unsolicited_exit => break,
                    }
                }
            }
            EndpointKind::Subscriber => {
                let inbound = inbound.ok_or_else(|| {
                    BridgeError::channel_error("subscriber stub missing inbound sender")
                })?;
                let mut inject = self.shared.take_inject().ok_or_else(|| {
                    BridgeError::channel_error("stub inject receiver already in use")
                })?;
                loop {
                    tokio::select! {
                        changed = stop.changed() => {
                            if changed.is_err() || *stop.borrow() {
                                break;
                            }
                        }
                        payload = inject.recv() => match payload {
                            Some(payload) => {
                                if inbound.send(InboundMessage::new(payload)).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                        _ = &mut unsolicited_exit => break,
                    }
                }
                self.shared.put_inject(inject);
            }
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Stub Factory
// ----------------------------------------------------------------------------

/// Factory handed to the controller in tests
pub struct StubFactory {
    shared: Arc<StubShared>,
    ready_delay: Duration,
    confirm_ready: bool,
    exit_after: Option<Duration>,
    fail_create: bool,
}

impl StubFactory {
    pub fn new() -> Self {
        Self {
            shared: StubShared::new(),
            ready_delay: Duration::ZERO,
            confirm_ready: true,
            exit_after: None,
            fail_create: false,
        }
    }

    /// Keep a handle to the shared counters before moving the factory
    /// into the controller
    pub fn shared(&self) -> Arc<StubShared> {
        Arc::clone(&self.shared)
    }

    /// Delay between spawn and readiness confirmation
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Tasks exit without ever confirming readiness
    pub fn without_ready_confirmation(mut self) -> Self {
        self.confirm_ready = false;
        self
    }

    /// Tasks exit on their own after the given delay
    pub fn with_exit_after(mut self, delay: Duration) -> Self {
        self.exit_after = Some(delay);
        self
    }

    /// `create` fails, simulating an unavailable bus library
    pub fn with_create_failure(mut self) -> Self {
        self.fail_create = true;
        self
    }
}

impl Default for StubFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointTaskFactory for StubFactory {
    fn create(&self, kind: EndpointKind) -> BridgeResult<Box<dyn EndpointTask>> {
        if self.fail_create {
            return Err(BridgeError::spawn_failed(
                kind,
                "stub factory configured to fail",
            ));
        }
        Ok(Box::new(StubEndpointTask {
            kind,
            shared: Arc::clone(&self.shared),
            channels: None,
            ready_delay: self.ready_delay,
            confirm_ready: self.confirm_ready,
            exit_after: self.exit_after,
        }))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
