use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;
use tracing::warn;

/// One audit trail record as returned by the events listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,

    /// Always set by the API; events without it are skipped by the poller.
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub locality: String,

    #[serde(default)]
    pub principal: Option<EventPrincipal>,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default)]
    pub project_id: Option<String>,

    pub source_ip: IpAddr,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub product_name: String,

    pub service_name: String,

    pub method_name: String,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub request_id: String,

    #[serde(default)]
    pub request_body: Option<Map<String, Value>>,

    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPrincipal {
    pub id: String,
}

/// Resource touched by an event.
///
/// Product specific details (`secm_secret_info`, `instance_server_info`, ...)
/// are kept verbatim in `details` so they survive into the log body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    RecordedAtAsc,
    RecordedAtDesc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::RecordedAtAsc => "recorded_at_asc",
            OrderBy::RecordedAtDesc => "recorded_at_desc",
        }
    }
}

/// Query for one page of events recorded in `[recorded_after, recorded_before)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEventsRequest {
    pub organization_id: String,
    pub page_size: u32,
    pub order_by: OrderBy,
    pub recorded_after: DateTime<Utc>,
    pub recorded_before: DateTime<Utc>,
    pub page_token: Option<String>,
}

/// One page of events.
///
/// Events are decoded one by one: an entry that does not match [`Event`] is
/// dropped with a warning and counted in `malformed`, so one bad event never
/// fails the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawListEventsResponse")]
pub struct ListEventsResponse {
    pub events: Vec<Event>,

    pub next_page_token: Option<String>,

    #[serde(skip)]
    pub malformed: usize,
}

#[derive(Deserialize)]
struct RawListEventsResponse {
    #[serde(default)]
    events: Vec<Value>,

    #[serde(default)]
    next_page_token: Option<String>,
}

impl From<RawListEventsResponse> for ListEventsResponse {
    fn from(raw: RawListEventsResponse) -> Self {
        let mut events = Vec::with_capacity(raw.events.len());
        let mut malformed = 0;

        for value in raw.events {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            match serde_json::from_value::<Event>(value) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(event_id = %id, error = %e, "Dropping undecodable event");
                    malformed += 1;
                }
            }
        }

        Self {
            events,
            next_page_token: raw.next_page_token,
            malformed,
        }
    }
}

impl ListEventsResponse {
    /// Token for the following page, if any. The API reports the last page
    /// either with a null or an empty token.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
