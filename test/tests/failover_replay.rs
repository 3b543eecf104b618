/// Crash and failover end to end.
///
/// After the active server dies, a spare is synchronized from it and every
/// connection reconnects, replaying whatever was still in flight. Replayed
/// transactions the old server already completed are answered from the
/// copied reply cache instead of being run a second time.

use std::{thread, time::Duration};

use passthrough_client::ConnectionPhase;
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
fn completed_transaction_is_replayed_from_the_cache() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 1,
            amount: 10,
        })
        .invoke()
        .unwrap()
        .get()
        .unwrap();

    // completes on the first server, but is still in flight when it dies
    let held = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::HoldUntilNext { account: 1 })
        .invoke(held.clone());
    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "COMPLETE"
    )));

    cluster.crash_active();
    assert_eq!(connection.phase(), ConnectionPhase::Disconnected);
    let spare = cluster.fail_over();
    assert_eq!(connection.phase(), ConnectionPhase::Attached);

    assert!(wait_until(Duration::from_secs(5), || has_event(
        &held, "RETIRED"
    )));
    assert_eq!(
        held.events(),
        vec!["SENT", "RECEIVED", "RESULT 10", "COMPLETE", "RETIRED"]
    );

    let holds = cluster
        .log()
        .records()
        .iter()
        .filter(|record| matches!(record.message, LedgerMessage::HoldUntilNext { .. }))
        .count();
    assert_eq!(holds, 1);
    assert_eq!(spare.cached_reply_count(connection.client_id()), 1);
    assert_eq!(cluster.active_container().with_entity(|e| e.balance(1)), 10);

    cluster.shutdown();
}

#[test]
fn message_lost_with_the_server_runs_on_the_spare() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    cluster.active_server().crash();
    let lost = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 2,
            amount: 3,
        })
        .invoke(lost.clone());
    thread::sleep(Duration::from_millis(30));
    assert_eq!(lost.events(), vec!["SENT"]);

    connection.disconnect();
    cluster.fail_over();

    assert!(wait_until(Duration::from_secs(5), || has_event(
        &lost, "RETIRED"
    )));
    assert_eq!(
        lost.events(),
        vec!["SENT", "RECEIVED", "RESULT 3", "COMPLETE", "RETIRED"]
    );
    let records = cluster.log().for_client(connection.client_id());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].server, 2);

    cluster.shutdown();
}

#[test]
fn invocation_parked_while_disconnected_runs_after_failover() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Deposit {
            account: 3,
            amount: 4,
        })
        .invoke()
        .unwrap()
        .get()
        .unwrap();

    cluster.crash_active();

    let parked_connection = connection.clone();
    let codec = cluster.codec();
    let parked = thread::spawn(move || {
        parked_connection
            .invoke(codec)
            .message(LedgerMessage::Deposit {
                account: 3,
                amount: 7,
            })
            .invoke()
            .and_then(|future| future.get())
    });
    thread::sleep(Duration::from_millis(30));
    assert!(!parked.is_finished());

    cluster.fail_over();

    // the spare started from the synchronized balance
    assert_eq!(parked.join().unwrap(), Ok(11));
    let records = cluster.log().for_client(connection.client_id());
    assert_eq!(records.last().map(|record| record.server), Some(2));

    cluster.shutdown();
}

#[test]
fn repeated_failovers_keep_transaction_ids_dense() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    for round in 0..3 {
        connection
            .invoke(cluster.codec())
            .message(LedgerMessage::Deposit {
                account: 4,
                amount: 1,
            })
            .invoke()
            .unwrap()
            .get()
            .unwrap();
        cluster.crash_active();
        let spare = cluster.fail_over();
        assert_eq!(spare.id().to_u64(), round + 2);
    }

    let balance = connection
        .invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 4 })
        .invoke()
        .unwrap()
        .get();
    assert_eq!(balance, Ok(3));

    // each reconnect handshake takes one transaction id
    let ids: Vec<u64> = cluster
        .log()
        .for_client(connection.client_id())
        .iter()
        .map(|record| record.transaction_id)
        .collect();
    assert_eq!(ids, vec![2, 4, 6, 8]);

    cluster.shutdown();
}
