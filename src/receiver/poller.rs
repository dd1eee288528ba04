use crate::client::{ClientError, EventSource};
use crate::event::{ListEventsRequest, OrderBy};
use crate::logs::{event_to_log_record, BatchBuilder, LogBatch};
use crate::sink::{LogSink, SinkError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("fetching events failed: {0}")]
    Fetch(#[from] ClientError),

    #[error("consuming logs failed: {0}")]
    Consume(#[from] SinkError),

    #[error("poll cancelled by shutdown")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub organization_id: String,
    /// Maximum number of events requested per page
    pub page_size: u32,
}

/// Outcome of a successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    pub pages: usize,
    pub records: usize,
    /// Events dropped because they could not be decoded or converted
    pub skipped: usize,
}

/// Fetches the events of one time window per call and ships them as a batch.
///
/// The cursor (`last_fetched_at`) is the inclusive start of the next window.
/// It only moves once every page of a window has been fetched, so a failed
/// window is asked for again on the next call.
pub struct Poller {
    client: Arc<dyn EventSource>,
    sink: Arc<dyn LogSink>,
    settings: PollerSettings,
    last_fetched_at: DateTime<Utc>,
    shutdown: CancellationToken,
}

impl Poller {
    /// New poller whose cursor starts now: no history is backfilled.
    pub fn new(
        client: Arc<dyn EventSource>,
        sink: Arc<dyn LogSink>,
        settings: PollerSettings,
    ) -> Self {
        Self::with_cursor(client, sink, settings, Utc::now())
    }

    pub fn with_cursor(
        client: Arc<dyn EventSource>,
        sink: Arc<dyn LogSink>,
        settings: PollerSettings,
        last_fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            client,
            sink,
            settings,
            last_fetched_at,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token observed between and during page requests.
    pub fn set_shutdown_token(&mut self, token: CancellationToken) {
        self.shutdown = token;
    }

    pub fn cursor(&self) -> DateTime<Utc> {
        self.last_fetched_at
    }

    /// Ship every event recorded in `[cursor, until)` and move the cursor to `until`.
    ///
    /// A fetch failure or cancellation discards what was collected and keeps
    /// the cursor. Once all pages are fetched the cursor advances even if the
    /// sink then rejects the batch; that error is still returned.
    pub async fn poll(&mut self, until: DateTime<Utc>) -> Result<PollSummary, PollError> {
        if until <= self.last_fetched_at {
            debug!(
                cursor = %self.last_fetched_at,
                until = %until,
                "Empty window, nothing to poll"
            );
            return Ok(PollSummary {
                after: self.last_fetched_at,
                before: until,
                pages: 0,
                records: 0,
                skipped: 0,
            });
        }

        let (batch, summary) = self.fetch_window(until).await?;

        self.last_fetched_at = until;

        if batch.is_empty() {
            debug!(until = %until, "No new events in window");
            return Ok(summary);
        }

        self.sink.consume(batch).await?;

        Ok(summary)
    }

    async fn fetch_window(
        &self,
        until: DateTime<Utc>,
    ) -> Result<(LogBatch, PollSummary), PollError> {
        let mut builder = BatchBuilder::new();
        let mut summary = PollSummary {
            after: self.last_fetched_at,
            before: until,
            pages: 0,
            records: 0,
            skipped: 0,
        };
        let mut page_token: Option<String> = None;

        loop {
            if self.shutdown.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            let request = ListEventsRequest {
                organization_id: self.settings.organization_id.clone(),
                page_size: self.settings.page_size,
                order_by: OrderBy::RecordedAtAsc,
                recorded_after: self.last_fetched_at,
                recorded_before: until,
                page_token: page_token.take(),
            };

            debug!(
                after = %request.recorded_after,
                before = %request.recorded_before,
                page_token = ?request.page_token,
                "List events"
            );

            let response = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(PollError::Cancelled),
                response = self.client.list_events(&request) => response?,
            };

            summary.pages += 1;
            summary.skipped += response.malformed;
            debug!(
                count = response.events.len(),
                malformed = response.malformed,
                "Events fetched"
            );

            for event in &response.events {
                match event_to_log_record(event) {
                    Ok(record) => {
                        builder.push(&event.service_name, record);
                        summary.records += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed event");
                        summary.skipped += 1;
                    }
                }
            }

            match response.next_page() {
                Some(token) => page_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok((builder.build(), summary))
    }
}
