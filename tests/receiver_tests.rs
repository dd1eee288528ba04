mod common;

use audit_trail_receiver::client::ClientError;
use audit_trail_receiver::event::Event;
use audit_trail_receiver::receiver::{
    AuditTrailReceiver, LifecycleState, Poller, PollerSettings, ReceiverError,
};
use chrono::Utc;
use common::{make_event, page, MemorySink, ScriptedSource};
use std::sync::Arc;
use std::time::Duration;

fn recent_event(id: &str) -> Event {
    let mut event = make_event(id, "scaleway.secret_manager.v1beta1.Api", 200, 0);
    event.recorded_at = Some(Utc::now());
    event
}

fn make_receiver(
    source: Arc<ScriptedSource>,
    sink: Arc<MemorySink>,
    interval: Duration,
) -> AuditTrailReceiver {
    let poller = Poller::new(
        source,
        sink,
        PollerSettings {
            organization_id: "org".to_string(),
            page_size: 100,
        },
    );
    AuditTrailReceiver::new(poller, interval).unwrap()
}

#[tokio::test]
async fn test_receiver_ships_events_on_tick() {
    let source = ScriptedSource::new(vec![page(vec![recent_event("1")], None)]);
    let sink = Arc::new(MemorySink::default());
    let mut receiver = make_receiver(source.clone(), sink.clone(), Duration::from_millis(25));

    receiver.start().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    receiver.shutdown().await.unwrap();

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].log_record_count(), 1);

    // every later window starts where the previous one ended
    let requests = source.requests();
    assert!(requests.len() >= 2);
    for pair in requests.windows(2) {
        assert_eq!(pair[1].recorded_after, pair[0].recorded_before);
    }
    assert_eq!(receiver.cursor(), Some(requests.last().unwrap().recorded_before));
}

#[tokio::test]
async fn test_failed_tick_does_not_stop_the_loop() {
    let source = ScriptedSource::new(vec![
        Err(ClientError::Api {
            status: 500,
            message: "internal error".to_string(),
        }),
        page(vec![recent_event("1")], None),
    ]);
    let sink = Arc::new(MemorySink::default());
    let mut receiver = make_receiver(source.clone(), sink.clone(), Duration::from_millis(25));
    let initial_cursor = receiver.cursor().unwrap();

    receiver.start().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    receiver.shutdown().await.unwrap();

    let requests = source.requests();
    assert!(requests.len() >= 2);
    // the failed window is asked for again from the same start
    assert_eq!(requests[0].recorded_after, initial_cursor);
    assert_eq!(requests[1].recorded_after, initial_cursor);
    assert_eq!(sink.batches().len(), 1);
}

#[tokio::test]
async fn test_shutdown_right_after_start_never_polls() {
    let source = ScriptedSource::new(vec![page(vec![recent_event("1")], None)]);
    let sink = Arc::new(MemorySink::default());
    let mut receiver = make_receiver(source.clone(), sink.clone(), Duration::from_secs(60));

    receiver.start().unwrap();
    receiver.shutdown().await.unwrap();

    assert_eq!(receiver.state(), LifecycleState::Stopped);
    assert!(source.requests().is_empty());
    assert!(sink.batches().is_empty());
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let source = ScriptedSource::new(vec![]);
    let sink = Arc::new(MemorySink::default());
    let mut receiver = make_receiver(source, sink, Duration::from_secs(60));

    assert_eq!(receiver.state(), LifecycleState::Created);
    receiver.start().unwrap();
    assert_eq!(receiver.state(), LifecycleState::Running);
    assert!(matches!(receiver.start(), Err(ReceiverError::AlreadyStarted)));

    receiver.shutdown().await.unwrap();
    assert_eq!(receiver.state(), LifecycleState::Stopped);
    receiver.shutdown().await.unwrap();
    assert_eq!(receiver.state(), LifecycleState::Stopped);
}
