#![allow(dead_code)]

use async_trait::async_trait;
use audit_trail_receiver::client::{ClientError, EventSource};
use audit_trail_receiver::event::{Event, ListEventsRequest, ListEventsResponse};
use audit_trail_receiver::logs::LogBatch;
use audit_trail_receiver::sink::{LogSink, SinkError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

pub type Reply = Result<ListEventsResponse, ClientError>;

/// Event source replaying scripted replies; empty pages once the script runs out.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ListEventsRequest>>,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ListEventsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn list_events(&self, request: &ListEventsRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ListEventsResponse::default()))
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub batches: Mutex<Vec<LogBatch>>,
}

impl MemorySink {
    pub fn batches(&self) -> Vec<LogBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn consume(&self, batch: LogBatch) -> Result<(), SinkError> {
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }
}

pub fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap()
}

pub fn make_event(id: &str, service: &str, status_code: u16, offset_secs: i64) -> Event {
    Event {
        id: id.to_string(),
        recorded_at: Some(window_start() + Duration::seconds(offset_secs)),
        locality: "fr-par".to_string(),
        principal: None,
        organization_id: "78a3f2fa-e53b-45c0-9d71-80ea1a349a62".to_string(),
        project_id: None,
        source_ip: IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)),
        user_agent: Some("curl/8.11.1".to_string()),
        product_name: "secret-manager".to_string(),
        service_name: service.to_string(),
        method_name: "CreateSecret".to_string(),
        resources: Vec::new(),
        request_id: format!("req-{}", id),
        request_body: None,
        status_code,
    }
}

pub fn page(events: Vec<Event>, next: Option<&str>) -> Reply {
    Ok(ListEventsResponse {
        events,
        next_page_token: next.map(str::to_string),
        malformed: 0,
    })
}
