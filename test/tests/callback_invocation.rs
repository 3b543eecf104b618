/// Callback invocations end to end.
///
/// Every stage reaches the callback exactly once and in order, whether the
/// invocation succeeds, fails on the server, or never leaves the client.

use std::{sync::Arc, thread, time::Duration};

use parking_lot::Mutex;

use passthrough_client::{InvocationCallback, InvokeError};
use passthrough_test::{wait_until, EventRecorder, LedgerMessage, TestCluster};

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn retired(recorder: &EventRecorder) -> bool {
    recorder.events().iter().any(|event| event == "RETIRED")
}

#[test]
fn stages_arrive_in_order() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorder = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .block_enqueuing()
        .message(LedgerMessage::Deposit {
            account: 1,
            amount: 5,
        })
        .invoke(recorder.clone());

    assert!(wait_until(Duration::from_secs(5), || retired(&recorder)));
    assert_eq!(
        recorder.events(),
        vec!["SENT", "RECEIVED", "RESULT 5", "COMPLETE", "RETIRED"]
    );

    cluster.shutdown();
}

#[test]
fn sent_is_reported_without_blocking_enqueue() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorder = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Balance { account: 2 })
        .invoke(recorder.clone());

    assert!(wait_until(Duration::from_secs(5), || retired(&recorder)));
    assert_eq!(recorder.events().first().map(String::as_str), Some("SENT"));
    assert_eq!(recorder.events().len(), 5);

    cluster.shutdown();
}

#[test]
fn checked_failure_is_reported_then_retired() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorder = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .message(LedgerMessage::Overdraw { account: 3 })
        .invoke(recorder.clone());

    assert!(wait_until(Duration::from_secs(5), || retired(&recorder)));
    assert_eq!(
        recorder.events(),
        vec![
            "SENT",
            "RECEIVED",
            "FAILURE Invocation failed: Entity rejected the invocation: account 3 overdrawn",
            "COMPLETE",
            "RETIRED"
        ]
    );

    cluster.shutdown();
}

#[test]
fn missing_message_fails_locally() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorder = EventRecorder::new();
    connection
        .async_invoke(cluster.codec())
        .invoke(recorder.clone());

    assert_eq!(
        recorder.events(),
        vec![
            "FAILURE No message was supplied to the invocation builder",
            "COMPLETE"
        ]
    );
    assert_eq!(connection.state().in_flight_count(), 0);

    cluster.shutdown();
}

#[test]
fn many_callbacks_all_retire() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorders: Vec<_> = (1..=20)
        .map(|amount| {
            let recorder = EventRecorder::new();
            connection
                .async_invoke(cluster.codec())
                .message(LedgerMessage::Deposit { account: 4, amount })
                .invoke(recorder.clone());
            recorder
        })
        .collect();

    assert!(wait_until(Duration::from_secs(5), || recorders
        .iter()
        .all(|recorder| retired(recorder))));
    assert_eq!(cluster.active_container().with_entity(|e| e.balance(4)), 210);
    assert_eq!(connection.state().in_flight_count(), 0);

    cluster.shutdown();
}

/// Callback whose `sent` is slow enough for the server to answer meanwhile
#[derive(Default)]
struct SlowSentRecorder {
    events: Mutex<Vec<String>>,
}

impl InvocationCallback<u64> for SlowSentRecorder {
    fn sent(&self) {
        thread::sleep(Duration::from_millis(20));
        self.events.lock().push("SENT".to_string());
    }

    fn received(&self) {
        self.events.lock().push("RECEIVED".to_string());
    }

    fn result(&self, response: u64) {
        self.events.lock().push(format!("RESULT {}", response));
    }

    fn failure(&self, error: InvokeError) {
        self.events.lock().push(format!("FAILURE {}", error));
    }

    fn complete(&self) {
        self.events.lock().push("COMPLETE".to_string());
    }

    fn retired(&self) {
        self.events.lock().push("RETIRED".to_string());
    }
}

#[test]
fn slow_sent_callback_still_comes_first() {
    init_logging();
    let mut cluster = TestCluster::new();
    let connection = cluster.connect();

    let recorder = Arc::new(SlowSentRecorder::default());
    connection
        .async_invoke(cluster.codec())
        .block_enqueuing()
        .message(LedgerMessage::Deposit {
            account: 2,
            amount: 6,
        })
        .invoke(recorder.clone());

    assert!(wait_until(Duration::from_secs(5), || recorder
        .events
        .lock()
        .iter()
        .any(|event| event == "RETIRED")));
    assert_eq!(
        *recorder.events.lock(),
        vec!["SENT", "RECEIVED", "RESULT 6", "COMPLETE", "RETIRED"]
    );

    cluster.shutdown();
}
