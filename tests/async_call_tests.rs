//! Integration tests for `AsyncCall` listener delivery.
//!
//! These tests verify that:
//! - Listeners registered before and after resolution each get exactly one delivery
//! - Every delivery runs on the designated main-thread executor
//! - A call resolves at most once

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use rstest::{fixture, rstest};

use noted::delivery::MainThreadExecutor;
use noted::{AsyncCall, AsyncResult, ErrorInfo, NetworkError};

type Deliveries<T> = Arc<Mutex<Vec<(usize, AsyncResult<T>, ThreadId)>>>;

#[fixture]
fn main_thread() -> MainThreadExecutor {
    MainThreadExecutor::spawn_named("test-main").unwrap()
}

fn record<T: Send + 'static>(
    deliveries: &Deliveries<T>,
    index: usize,
) -> impl FnOnce(AsyncResult<T>) + Send + 'static {
    let deliveries = Arc::clone(deliveries);
    move |result| {
        deliveries
            .lock()
            .push((index, result, thread::current().id()));
    }
}

// =============================================================================
// Before / after resolution
// =============================================================================

#[rstest]
fn early_and_late_listeners_receive_identical_result(main_thread: MainThreadExecutor) {
    let call = AsyncCall::new(main_thread.clone());
    let deliveries: Deliveries<&str> = Arc::new(Mutex::new(Vec::new()));

    call.add_listener(record(&deliveries, 0));
    call.resolve_success("title").unwrap();
    call.add_listener(record(&deliveries, 1));
    main_thread.flush();

    let deliveries = deliveries.lock();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].1, deliveries[1].1);
    assert_eq!(deliveries[0].1, AsyncResult::Success("title"));
}

#[rstest]
fn late_listener_is_scheduled_at_registration(main_thread: MainThreadExecutor) {
    let call = AsyncCall::new(main_thread.clone());
    call.resolve_failure(ErrorInfo::new("offline")).unwrap();
    main_thread.flush();

    let (sender, receiver) = mpsc::channel();
    call.add_listener(move |result: AsyncResult<u8>| sender.send(result).unwrap());

    assert_eq!(
        receiver.recv().unwrap(),
        AsyncResult::Failure(ErrorInfo::new("offline"))
    );
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(64)]
fn queued_listeners_all_receive_result_in_order(
    main_thread: MainThreadExecutor,
    #[case] listeners: usize,
) {
    let call = AsyncCall::new(main_thread.clone());
    let deliveries: Deliveries<u32> = Arc::new(Mutex::new(Vec::new()));
    for index in 0..listeners {
        call.add_listener(record(&deliveries, index));
    }
    assert!(deliveries.lock().is_empty());

    call.resolve_success(42).unwrap();
    main_thread.flush();

    let deliveries = deliveries.lock();
    assert_eq!(
        deliveries.iter().map(|(index, _, _)| *index).collect::<Vec<_>>(),
        (0..listeners).collect::<Vec<_>>()
    );
    assert!(
        deliveries
            .iter()
            .all(|(_, result, thread)| *result == AsyncResult::Success(42)
                && *thread == main_thread.thread_id())
    );
}

#[rstest]
fn same_listener_logic_registered_twice_runs_twice(main_thread: MainThreadExecutor) {
    let call = AsyncCall::new(main_thread.clone());
    let deliveries: Deliveries<i32> = Arc::new(Mutex::new(Vec::new()));
    call.add_listener(record(&deliveries, 7));
    call.add_listener(record(&deliveries, 7));
    call.resolve_success(1).unwrap();
    main_thread.flush();

    assert_eq!(deliveries.lock().len(), 2);
    assert_eq!(call.listener_count(), 2);
}

// =============================================================================
// Delivery context
// =============================================================================

#[rstest]
fn delivery_never_runs_on_resolving_or_registering_thread(main_thread: MainThreadExecutor) {
    let call = AsyncCall::new(main_thread.clone());
    let deliveries: Deliveries<i32> = Arc::new(Mutex::new(Vec::new()));

    let registering = {
        let call = call.clone();
        let deliveries = Arc::clone(&deliveries);
        thread::spawn(move || {
            call.add_listener(record(&deliveries, 0));
            thread::current().id()
        })
        .join()
        .unwrap()
    };
    let resolving = {
        let call = call.clone();
        thread::spawn(move || {
            call.resolve_success(3).unwrap();
            thread::current().id()
        })
        .join()
        .unwrap()
    };
    main_thread.flush();

    let deliveries = deliveries.lock();
    assert_eq!(deliveries.len(), 1);
    let delivered_on = deliveries[0].2;
    assert_eq!(delivered_on, main_thread.thread_id());
    assert_ne!(delivered_on, registering);
    assert_ne!(delivered_on, resolving);
    assert_ne!(delivered_on, thread::current().id());
}

// =============================================================================
// Single resolution
// =============================================================================

#[rstest]
fn racing_resolvers_resolve_exactly_once(main_thread: MainThreadExecutor) {
    let call = AsyncCall::new(main_thread.clone());
    let deliveries: Deliveries<usize> = Arc::new(Mutex::new(Vec::new()));
    call.add_listener(record(&deliveries, 0));

    let outcomes: Vec<_> = (0..16)
        .map(|value| {
            let call = call.clone();
            thread::spawn(move || call.resolve_success(value))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    main_thread.flush();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .filter(|outcome| outcome.is_err())
            .all(|outcome| *outcome == Err(NetworkError::AlreadyResolved))
    );

    let deliveries = deliveries.lock();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(Some(deliveries[0].1.clone()), call.result());
}

#[rstest]
#[tokio::test]
async fn wait_and_listener_see_the_same_result() {
    let main_thread = MainThreadExecutor::spawn().unwrap();
    let call = AsyncCall::new(main_thread.clone());
    let (sender, receiver) = mpsc::channel();
    call.add_listener(move |result| sender.send(result).unwrap());

    let waiter = call.wait();
    call.resolve_success(String::from("hello")).unwrap();

    assert_eq!(waiter.await, Ok(String::from("hello")));
    assert_eq!(
        receiver.recv().unwrap(),
        AsyncResult::Success(String::from("hello"))
    );
}
