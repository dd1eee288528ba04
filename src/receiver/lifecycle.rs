use crate::client::{AuditTrailClient, ClientError};
use crate::config::{Config, MAX_INTERVAL};
use crate::receiver::poller::{PollError, Poller, PollerSettings};
use crate::sink::LogSink;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("receiver already started")]
    AlreadyStarted,

    #[error("receiver is stopped and cannot be restarted")]
    Stopped,

    #[error("receiver must be started from within a tokio runtime")]
    NoRuntime,

    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("poll interval {0:?} is longer than one week")]
    IntervalTooLong(Duration),

    #[error("audit trail client error: {0}")]
    Client(#[from] ClientError),

    #[error("polling task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Runs a [`Poller`] on a fixed interval in one background task.
///
/// Ticks never overlap: a poll that overruns the interval delays the next
/// tick. Shutdown is observed while waiting for a tick and between page
/// requests; the cursor is never left half-updated.
pub struct AuditTrailReceiver {
    interval: Duration,
    state: LifecycleState,
    poller: Option<Poller>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<Poller>>,
}

impl AuditTrailReceiver {
    pub fn new(mut poller: Poller, interval: Duration) -> Result<Self, ReceiverError> {
        if interval.is_zero() {
            return Err(ReceiverError::ZeroInterval);
        }
        if interval > MAX_INTERVAL {
            return Err(ReceiverError::IntervalTooLong(interval));
        }

        let shutdown = CancellationToken::new();
        poller.set_shutdown_token(shutdown.clone());

        Ok(Self {
            interval,
            state: LifecycleState::Created,
            poller: Some(poller),
            shutdown,
            handle: None,
        })
    }

    /// Build the HTTP client from `config` and wire it to `sink`.
    ///
    /// Expects an already validated config.
    pub fn from_config(config: &Config, sink: Arc<dyn LogSink>) -> Result<Self, ReceiverError> {
        let client = AuditTrailClient::new(&config.scaleway)?;
        let poller = Poller::new(
            Arc::new(client),
            sink,
            PollerSettings {
                organization_id: config.scaleway.organization_id.clone(),
                page_size: config.receiver.max_events_per_request,
            },
        );

        Self::new(poller, config.receiver.interval)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cursor of the poller while it is not owned by the polling task.
    pub fn cursor(&self) -> Option<DateTime<Utc>> {
        self.poller.as_ref().map(Poller::cursor)
    }

    /// Launch the polling task. Fails unless the receiver is freshly created.
    pub fn start(&mut self) -> Result<(), ReceiverError> {
        match self.state {
            LifecycleState::Created => {}
            LifecycleState::Running | LifecycleState::Stopping => {
                return Err(ReceiverError::AlreadyStarted)
            }
            LifecycleState::Stopped => return Err(ReceiverError::Stopped),
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ReceiverError::NoRuntime)?;
        let poller = self.poller.take().ok_or(ReceiverError::AlreadyStarted)?;

        info!(interval = ?self.interval, "Starting audit trail receiver");

        self.handle = Some(runtime.spawn(run_polling(
            poller,
            self.interval,
            self.shutdown.clone(),
        )));
        self.state = LifecycleState::Running;

        Ok(())
    }

    /// Stop the polling task and wait for it to exit.
    ///
    /// Safe to call in any state and any number of times.
    pub async fn shutdown(&mut self) -> Result<(), ReceiverError> {
        match self.state {
            LifecycleState::Created | LifecycleState::Stopped => {
                self.state = LifecycleState::Stopped;
                return Ok(());
            }
            LifecycleState::Running | LifecycleState::Stopping => {}
        }

        debug!("Shutting down audit trail receiver");
        self.state = LifecycleState::Stopping;
        self.shutdown.cancel();

        // The handle stays in place until joined so a dropped shutdown future
        // can be resumed by calling shutdown again.
        if let Some(handle) = self.handle.as_mut() {
            let joined = handle.await;
            self.handle = None;
            self.state = LifecycleState::Stopped;
            self.poller = Some(joined?);
        }

        self.state = LifecycleState::Stopped;
        info!("Audit trail receiver stopped");

        Ok(())
    }
}

async fn run_polling(mut poller: Poller, period: Duration, shutdown: CancellationToken) -> Poller {
    // First tick one full period after start, like a plain ticker.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let until = Utc::now();
                info!(until = %until, "Polling audit trail events");

                match poller.poll(until).await {
                    Ok(summary) => info!(
                        after = %summary.after,
                        before = %summary.before,
                        pages = summary.pages,
                        records = summary.records,
                        skipped = summary.skipped,
                        "Poll completed"
                    ),
                    Err(PollError::Cancelled) => {
                        debug!("Poll interrupted by shutdown");
                        break;
                    }
                    Err(e) => error!(error = %e, "there was an error during the poll"),
                }
            }
        }
    }

    debug!(cursor = %poller.cursor(), "Polling task exited");
    poller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EventSource;
    use crate::event::{ListEventsRequest, ListEventsResponse};
    use crate::logs::LogBatch;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventSource for CountingSource {
        async fn list_events(
            &self,
            _request: &ListEventsRequest,
        ) -> Result<ListEventsResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ListEventsResponse::default())
        }
    }

    #[derive(Default)]
    struct CountingSink {
        batches: AtomicUsize,
    }

    #[async_trait]
    impl LogSink for CountingSink {
        async fn consume(&self, _batch: LogBatch) -> Result<(), SinkError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_receiver(
        interval: Duration,
    ) -> (AuditTrailReceiver, Arc<CountingSource>, Arc<CountingSink>) {
        let source = Arc::new(CountingSource::default());
        let sink = Arc::new(CountingSink::default());
        let poller = Poller::new(
            source.clone(),
            sink.clone(),
            PollerSettings {
                organization_id: "org".to_string(),
                page_size: 100,
            },
        );
        (
            AuditTrailReceiver::new(poller, interval).unwrap(),
            source,
            sink,
        )
    }

    #[tokio::test]
    async fn test_start_then_immediate_shutdown() {
        let (mut receiver, source, sink) = make_receiver(Duration::from_secs(60));
        let initial_cursor = receiver.cursor().unwrap();

        receiver.start().unwrap();
        assert_eq!(receiver.state(), LifecycleState::Running);
        assert!(receiver.cursor().is_none());

        receiver.shutdown().await.unwrap();
        assert_eq!(receiver.state(), LifecycleState::Stopped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.batches.load(Ordering::SeqCst), 0);
        assert_eq!(receiver.cursor(), Some(initial_cursor));
    }

    #[tokio::test]
    async fn test_start_twice_is_an_error() {
        let (mut receiver, _, _) = make_receiver(Duration::from_secs(60));

        receiver.start().unwrap();
        assert!(matches!(receiver.start(), Err(ReceiverError::AlreadyStarted)));

        receiver.shutdown().await.unwrap();
        assert!(matches!(receiver.start(), Err(ReceiverError::Stopped)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_works_without_start() {
        let (mut receiver, _, _) = make_receiver(Duration::from_secs(60));

        receiver.shutdown().await.unwrap();
        receiver.shutdown().await.unwrap();
        assert_eq!(receiver.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_ticks_poll_and_advance_cursor() {
        let (mut receiver, source, sink) = make_receiver(Duration::from_millis(20));
        let initial_cursor = receiver.cursor().unwrap();

        receiver.start().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        receiver.shutdown().await.unwrap();

        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        // empty windows are not forwarded
        assert_eq!(sink.batches.load(Ordering::SeqCst), 0);
        assert!(receiver.cursor().unwrap() > initial_cursor);
    }

    fn make_poller() -> Poller {
        Poller::new(
            Arc::new(CountingSource::default()),
            Arc::new(CountingSink::default()),
            PollerSettings {
                organization_id: "org".to_string(),
                page_size: 1,
            },
        )
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(matches!(
            AuditTrailReceiver::new(make_poller(), Duration::ZERO),
            Err(ReceiverError::ZeroInterval)
        ));
    }

    #[test]
    fn test_interval_longer_than_a_week_is_rejected() {
        let interval = Duration::from_secs(u64::MAX);
        assert!(matches!(
            AuditTrailReceiver::new(make_poller(), interval),
            Err(ReceiverError::IntervalTooLong(d)) if d == interval
        ));
        assert!(AuditTrailReceiver::new(make_poller(), MAX_INTERVAL).is_ok());
    }

    #[test]
    fn test_start_outside_runtime_is_an_error() {
        let (mut receiver, _, _) = make_receiver(Duration::from_secs(60));

        assert!(matches!(receiver.start(), Err(ReceiverError::NoRuntime)));
        assert_eq!(receiver.state(), LifecycleState::Created);
    }
}
