//! Lifecycle integration tests
//!
//! Exercises the controller, dispatcher and sink together against the
//! stub endpoint tasks: concurrent starts, cooperative stops, restart
//! cycles, unsolicited exits, and end-to-end message flow.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use busbridge_runtime::testing::StubFactory;
use busbridge_runtime::{
    BridgeConfig, BridgeError, BridgeHandle, ControlError, DispatchError, EndpointController,
    EndpointKind, EndpointState, InboundHandler, InboundMessage,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn noop_handler() -> Box<dyn InboundHandler> {
    Box::new(|_msg: InboundMessage| Ok(()))
}

fn collecting_handler() -> (Box<dyn InboundHandler>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_handler = Arc::clone(&seen);
    let handler = Box::new(move |msg: InboundMessage| {
        seen_by_handler.lock().unwrap().push(msg.into_payload());
        Ok(())
    });
    (handler, seen)
}

fn controller_with(factory: StubFactory, handler: Box<dyn InboundHandler>) -> EndpointController {
    EndpointController::new(BridgeConfig::testing(), Box::new(factory), handler)
        .expect("controller creation failed")
}

async fn wait_for_state(controller: &EndpointController, kind: EndpointKind, state: EndpointState) {
    let mut rx = controller.watch_state(kind);
    tokio::time::timeout(Duration::from_secs(2), async {
        while *rx.borrow_and_update() != state {
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind} to reach {state}"));
}

async fn wait_for_inbound(seen: &Arc<Mutex<Vec<String>>>, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while seen.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for inbound messages");
}

// ----------------------------------------------------------------------------
// Start/Stop Properties
// ----------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_starts_spawn_exactly_one_task() {
    init_tracing();
    let factory = StubFactory::new().with_ready_delay(Duration::from_millis(20));
    let shared = factory.shared();
    let controller = Arc::new(controller_with(factory, noop_handler()));

    let mut joins = Vec::new();
    for _ in 0..8 {
        let controller = Arc::clone(&controller);
        joins.push(tokio::spawn(async move {
            controller.start(EndpointKind::Publisher).await.unwrap()
        }));
    }

    let spawned: usize = futures::future::join_all(joins)
        .await
        .into_iter()
        .map(|r| r.unwrap() as usize)
        .sum();

    assert_eq!(spawned, 1, "exactly one start call should spawn");
    assert_eq!(shared.spawn_count(EndpointKind::Publisher), 1);
    assert_eq!(shared.max_running(EndpointKind::Publisher), 1);
}

#[tokio::test]
async fn start_stop_cycles_never_overlap_tasks() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();
    let controller = controller_with(factory, noop_handler());

    for _ in 0..5 {
        assert!(controller.start(EndpointKind::Publisher).await.unwrap());
        assert!(controller.stop(EndpointKind::Publisher).await.unwrap());
    }

    assert_eq!(shared.spawn_count(EndpointKind::Publisher), 5);
    assert_eq!(shared.max_running(EndpointKind::Publisher), 1);
    assert_eq!(shared.currently_running(EndpointKind::Publisher), 0);
}

#[tokio::test]
async fn stop_is_idempotent() {
    init_tracing();
    let controller = controller_with(StubFactory::new(), noop_handler());

    assert!(controller.start(EndpointKind::Subscriber).await.unwrap());
    assert!(controller.stop(EndpointKind::Subscriber).await.unwrap());
    // Second and third stops are no-op successes.
    assert!(!controller.stop(EndpointKind::Subscriber).await.unwrap());
    assert!(!controller.stop(EndpointKind::Subscriber).await.unwrap());
    assert_eq!(
        controller.state(EndpointKind::Subscriber),
        EndpointState::Stopped
    );
}

#[tokio::test]
async fn cooperative_stop_lets_the_task_exit() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();
    let controller = controller_with(factory, noop_handler());

    controller.start(EndpointKind::Publisher).await.unwrap();
    assert_eq!(shared.currently_running(EndpointKind::Publisher), 1);

    controller.stop(EndpointKind::Publisher).await.unwrap();
    assert_eq!(shared.currently_running(EndpointKind::Publisher), 0);
}

#[tokio::test]
async fn unsolicited_task_exit_resets_to_stopped() {
    init_tracing();
    let factory = StubFactory::new().with_exit_after(Duration::from_millis(20));
    let controller = controller_with(factory, noop_handler());

    controller.start(EndpointKind::Publisher).await.unwrap();
    assert!(controller.is_running(EndpointKind::Publisher));

    wait_for_state(&controller, EndpointKind::Publisher, EndpointState::Stopped).await;

    // The slot is free again.
    assert!(controller.start(EndpointKind::Publisher).await.unwrap());
}

#[tokio::test]
async fn confirmation_timeout_reverts_to_stopped() {
    init_tracing();
    let factory = StubFactory::new()
        .with_ready_delay(Duration::from_secs(10))
        .without_ready_confirmation();
    let controller = controller_with(factory, noop_handler());

    let err = controller
        .start(EndpointKind::Publisher)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Control(ControlError::ConfirmationTimeout { .. })
    ));
    assert_eq!(
        controller.state(EndpointKind::Publisher),
        EndpointState::Stopped
    );
}

#[tokio::test]
async fn early_exit_without_confirmation_is_spawn_failure() {
    init_tracing();
    let factory = StubFactory::new().without_ready_confirmation();
    let controller = controller_with(factory, noop_handler());

    let err = controller
        .start(EndpointKind::Subscriber)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Control(ControlError::SpawnFailed { .. })
    ));
    assert_eq!(
        controller.state(EndpointKind::Subscriber),
        EndpointState::Stopped
    );
}

// ----------------------------------------------------------------------------
// Dispatch Properties
// ----------------------------------------------------------------------------

#[tokio::test]
async fn send_while_stopped_enqueues_nothing() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();
    let bridge = BridgeHandle::new(
        BridgeConfig::testing(),
        Box::new(factory),
        noop_handler(),
    )
    .unwrap();

    let err = bridge.send_message(Some("lost")).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Dispatch(DispatchError::NoActivePublisher)
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(shared.transmitted().is_empty());
}

#[tokio::test]
async fn send_fails_until_publisher_confirms_running() {
    init_tracing();
    let factory = StubFactory::new().with_ready_delay(Duration::from_millis(50));
    let shared = factory.shared();
    let controller = Arc::new(controller_with(factory, noop_handler()));

    // Kick off the start the way the boundary does: fire-and-forget.
    let starter = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start(EndpointKind::Publisher).await })
    };

    let dispatcher = busbridge_runtime::MessageDispatcher::new(Arc::clone(&controller));
    let err = dispatcher
        .send(busbridge_runtime::OutboundMessage::new("hello"))
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Dispatch(DispatchError::NoActivePublisher)
    ));

    wait_for_state(&controller, EndpointKind::Publisher, EndpointState::Running).await;
    dispatcher
        .send(busbridge_runtime::OutboundMessage::new("hello"))
        .unwrap();

    shared.wait_for_transmitted(1, Duration::from_secs(1)).await;
    assert_eq!(shared.transmitted(), vec!["hello"]);
    starter.await.unwrap().unwrap();
}

#[tokio::test]
async fn send_after_stop_reports_no_active_publisher() {
    init_tracing();
    let factory = StubFactory::new();
    let controller = Arc::new(controller_with(factory, noop_handler()));
    let dispatcher = busbridge_runtime::MessageDispatcher::new(Arc::clone(&controller));

    controller.start(EndpointKind::Publisher).await.unwrap();
    controller.stop(EndpointKind::Publisher).await.unwrap();

    // After stop the dispatcher reports the publisher gone rather than
    // silently queueing into nowhere.
    let err = dispatcher
        .send(busbridge_runtime::OutboundMessage::new("late"))
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Dispatch(DispatchError::NoActivePublisher)
    ));
}

// ----------------------------------------------------------------------------
// Inbound Delivery Properties
// ----------------------------------------------------------------------------

#[tokio::test]
async fn inbound_messages_arrive_in_order() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();
    let (handler, seen) = collecting_handler();
    let controller = controller_with(factory, handler);

    controller.start(EndpointKind::Subscriber).await.unwrap();

    shared.emit("A");
    shared.emit("B");
    shared.emit("C");

    wait_for_inbound(&seen, 3).await;
    assert_eq!(*seen.lock().unwrap(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn handler_failure_does_not_stop_the_subscriber() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_handler = Arc::clone(&seen);
    let handler = Box::new(move |msg: InboundMessage| {
        let payload = msg.into_payload();
        if payload == "poison" {
            return Err(busbridge_runtime::HandlerFailure::new("rejected"));
        }
        seen_by_handler.lock().unwrap().push(payload);
        Ok(())
    });

    let controller = controller_with(factory, handler);
    controller.start(EndpointKind::Subscriber).await.unwrap();

    shared.emit("poison");
    shared.emit("after");

    wait_for_inbound(&seen, 1).await;
    assert_eq!(*seen.lock().unwrap(), vec!["after"]);
    assert!(controller.is_running(EndpointKind::Subscriber));
}

#[tokio::test]
async fn subscriber_restart_keeps_delivering() {
    init_tracing();
    let factory = StubFactory::new();
    let shared = factory.shared();
    let (handler, seen) = collecting_handler();
    let controller = controller_with(factory, handler);

    controller.start(EndpointKind::Subscriber).await.unwrap();
    shared.emit("first");
    wait_for_inbound(&seen, 1).await;

    controller.stop(EndpointKind::Subscriber).await.unwrap();
    controller.start(EndpointKind::Subscriber).await.unwrap();

    shared.emit("second");
    wait_for_inbound(&seen, 2).await;
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(shared.spawn_count(EndpointKind::Subscriber), 2);
}
