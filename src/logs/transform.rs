use crate::event::Event;
use crate::logs::record::{Attributes, LogRecord, Severity};
use thiserror::Error;
use tracing::warn;

pub const ATTR_EVENT_ID: &str = "audit_trail.event.id";
pub const ATTR_LOCALITY: &str = "audit_trail.event.locality";
pub const ATTR_SOURCE_IP: &str = "audit_trail.event.source_ip";
pub const ATTR_STATUS_CODE: &str = "audit_trail.event.status_code";
pub const ATTR_REQUEST_ID: &str = "audit_trail.event.request_id";
pub const ATTR_USER_AGENT: &str = "audit_trail.event.user_agent";

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("event {event_id} has no recorded_at timestamp")]
    MissingRecordedAt { event_id: String },
}

/// Convert one audit event into a log record.
///
/// Fails only for events without `recorded_at`. A body that cannot be
/// encoded is reported and left empty, the record is still produced.
pub fn event_to_log_record(event: &Event) -> Result<LogRecord, TransformError> {
    let timestamp = event
        .recorded_at
        .ok_or_else(|| TransformError::MissingRecordedAt {
            event_id: event.id.clone(),
        })?;

    let body = match serde_json::to_string(event) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Unable to encode event body");
            None
        }
    };

    Ok(LogRecord {
        timestamp,
        event_name: event.method_name.clone(),
        severity: Severity::from_status_code(event.status_code),
        body,
        attributes: event_attributes(event),
    })
}

fn event_attributes(event: &Event) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.put(ATTR_EVENT_ID, event.id.as_str());
    attrs.put(ATTR_LOCALITY, event.locality.as_str());
    attrs.put(ATTR_SOURCE_IP, event.source_ip.to_string());
    attrs.put(ATTR_STATUS_CODE, i64::from(event.status_code));
    attrs.put(ATTR_REQUEST_ID, event.request_id.as_str());

    if let Some(user_agent) = &event.user_agent {
        attrs.put(ATTR_USER_AGENT, user_agent.as_str());
    }

    attrs
}
