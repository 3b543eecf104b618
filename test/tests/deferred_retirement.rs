/// Deferred retirement end to end.
///
/// A `HoldUntilNext` invocation completes right away but asks the server to
/// hold its retirement until the same client's next transaction. Every
/// retirement queued behind it waits too, and the whole chain is released
/// in order once the blocker finishes.

use std::{thread, time::Duration};

use passthrough_client::InvokeError;
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
fn held_invocation_retires_after_the_next_one() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let held = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::HoldUntilNext { account: 1 })
        .invoke(held.clone());

    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "COMPLETE"
    )));
    thread::sleep(Duration::from_millis(30));
    assert!(!has_event(&held, "RETIRED"));
    assert_eq!(connection.state().in_flight_count(), 1);

    let future = connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 1,
            amount: 5,
        })
        .invoke()
        .unwrap();
    assert_eq!(future.get(), Ok(5));

    // the blocker's retirement is delivered before the one that released it
    assert!(has_event(&held, "RETIRED"));
    assert_eq!(
        held.events(),
        vec!["SENT", "RECEIVED", "RESULT 0", "COMPLETE", "RETIRED"]
    );
    assert_eq!(connection.state().in_flight_count(), 0);

    cluster.shutdown();
}

#[test]
fn entity_sees_the_held_transaction_as_oldest() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let held = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::HoldUntilNext { account: 2 })
        .invoke(held.clone());
    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "COMPLETE"
    )));

    connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 2 })
        .invoke()
        .unwrap()
        .get()
        .unwrap();

    let seen: Vec<(u64, u64)> = cluster
        .log()
        .for_client(connection.client_id())
        .iter()
        .map(|record| (record.transaction_id, record.oldest_transaction_id))
        .collect();
    assert_eq!(seen, vec![(2, 2), (3, 2)]);

    cluster.shutdown();
}

#[test]
fn blocking_get_on_a_held_invocation_times_out_until_released() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let held = connection
        .invoke(cluster.codec())
        .ack_completed()
        .message(LedgerMessage::HoldUntilNext { account: 3 })
        .invoke()
        .unwrap();

    // completed, but the result is withheld until retirement
    assert_eq!(
        held.get_timeout(Duration::from_millis(50)),
        Err(InvokeError::Timeout)
    );

    let next = connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 3,
            amount: 2,
        })
        .invoke()
        .unwrap();
    assert_eq!(next.get(), Ok(2));
    assert_eq!(held.get(), Ok(0));

    cluster.shutdown();
}

#[test]
fn result_can_be_read_at_completion_when_not_blocking_on_retire() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let held = connection
        .invoke(cluster.codec())
        .block_get_on_retire(false)
        .message(LedgerMessage::HoldUntilNext { account: 4 })
        .invoke()
        .unwrap();

    assert_eq!(held.get(), Ok(0));
    assert_eq!(connection.state().in_flight_count(), 1);

    connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 4 })
        .invoke()
        .unwrap()
        .get()
        .unwrap();
    assert!(wait_until(Duration::from_secs(5), || connection
        .state()
        .in_flight_count()
        == 0));

    cluster.shutdown();
}

#[test]
fn a_blocker_holds_other_clients_retirements_too() {
    init_logging();
    let mut cluster = TestCluster::new();
    let holder = cluster.connect();
    let other = cluster.connect();

    let held = EventRecorder::new();
    holder
        .async_invoke(cluster.codec())
        .message(LedgerMessage::HoldUntilNext { account: 1 })
        .invoke(held.clone());
    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "COMPLETE"
    )));

    let queued = EventRecorder::new();
    other
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 2,
            amount: 9,
        })
        .invoke(queued.clone());
    assert!(wait_until(Duration::from_secs(5), || has_event(
        &queued, "COMPLETE"
    )));
    thread::sleep(Duration::from_millis(30));
    assert!(!has_event(&queued, "RETIRED"));

    holder
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 1 })
        .invoke()
        .unwrap()
        .get()
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || has_event(
        &queued, "RETIRED"
    )));
    assert!(has_event(&held, "RETIRED"));

    cluster.shutdown();
}
