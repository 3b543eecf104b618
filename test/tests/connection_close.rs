/// Closing a connection with work still outstanding.
///
/// Every blocking caller and every callback still waiting on the connection
/// is released with `ConnectionClosed`, and nothing can be sent afterwards.

use std::{thread, time::Duration};

use passthrough_client::{ConnectionPhase, InvokeError};
use passthrough_test::{wait_until, EventRecorder, LedgerMessage, TestCluster};

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn has_event(recorder: &EventRecorder, event: &str) -> bool {
    recorder.events().iter().any(|seen| seen == event)
}

#[test]
fn close_releases_callers_blocked_on_retirement() {
    init_logging();
    let mut cluster = TestCluster::new();
    let holder = cluster.connect();
    let closing = cluster.connect();

    // hold the retirement chain so that the other client's results stay
    // withheld
    let held = EventRecorder::new();
    holder
        .async_invoke(cluster.codec())
        .message(LedgerMessage::HoldUntilNext { account: 1 })
        .invoke(held.clone());
    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "COMPLETE"
    )));

    let callers: Vec<_> = (1..=4)
        .map(|amount| {
            let connection = closing.clone();
            let codec = cluster.codec();
            thread::spawn(move || {
                connection
                    .invoke(codec)
                    .ack_completed()
                    .message(LedgerMessage::Deposit { account: 2, amount })
                    .invoke()
                    .and_then(|future| future.get())
            })
        })
        .collect();
    assert!(wait_until(Duration::from_secs(5), || cluster
        .log()
        .for_client(closing.client_id())
        .len()
        == 4));
    thread::sleep(Duration::from_millis(30));
    assert!(callers.iter().all(|caller| !caller.is_finished()));

    closing.close();
    assert_eq!(closing.phase(), ConnectionPhase::Closed);
    for caller in callers {
        assert_eq!(caller.join().unwrap(), Err(InvokeError::ConnectionClosed));
    }
    assert_eq!(closing.state().in_flight_count(), 0);

    // releasing the chain later delivers retirements the closed connection
    // ignores
    holder
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 1 })
        .invoke()
        .unwrap()
        .get()
        .unwrap();
    assert!(has_event(&held, "RETIRED"));

    cluster.shutdown();
}

#[test]
fn close_while_disconnected_fails_everything_outstanding() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    cluster.active_server().crash();
    let pending = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 3,
            amount: 1,
        })
        .invoke(pending.clone());
    cluster.crash_active();

    let parked_connection = connection.clone();
    let codec = cluster.codec();
    let parked = thread::spawn(move || {
        parked_connection
            .invoke(codec)
            .message(LedgerMessage::Balance { account: 3 })
            .invoke()
            .and_then(|future| future.get())
    });
    thread::sleep(Duration::from_millis(30));
    assert!(!parked.is_finished());

    connection.close();

    assert_eq!(parked.join().unwrap(), Err(InvokeError::ConnectionClosed));
    assert_eq!(
        pending.events(),
        vec![
            "SENT",
            "FAILURE Connection closed before the invocation finished",
            "COMPLETE"
        ]
    );
    assert!(cluster.log().is_empty());

    cluster.shutdown();
}

#[test]
fn invocations_after_close_fail_immediately() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();
    connection.close();

    let result = connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 1 })
        .invoke()
        .and_then(|future| future.get());
    assert_eq!(result, Err(InvokeError::ConnectionClosed));

    let rejected = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 1 })
        .invoke(rejected.clone());
    assert!(has_event(
        &rejected,
        "FAILURE Connection closed before the invocation finished"
    ));
    assert_eq!(cluster.active_server().client_count(), 0);

    cluster.shutdown();
}
