use crate::logs::{LogBatch, LogRecord, ResourceLogs};
use crate::sink::traits::{LogSink, SinkError};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::json;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes every log record as one JSON object per line.
pub struct JsonLinesSink {
    writer: Mutex<Writer>,
}

impl JsonLinesSink {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Open `path` in append mode, creating it and its parent directory.
    pub async fn file(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self::new(file))
    }
}

fn encode_line(resource: &ResourceLogs, record: &LogRecord) -> Result<Vec<u8>, SinkError> {
    let line = json!({
        "timestamp": record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        "event_name": record.event_name,
        "severity_text": record.severity.text(),
        "severity_number": record.severity.number(),
        "body": record.body,
        "attributes": record.attributes,
        "resource": resource.resource,
        "scope": resource.scope_name,
    });

    let mut bytes = serde_json::to_vec(&line)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[async_trait]
impl LogSink for JsonLinesSink {
    async fn consume(&self, batch: LogBatch) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        for resource in batch.resource_logs() {
            for record in &resource.records {
                buf.extend(encode_line(resource, record)?);
            }
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&buf).await?;
        writer.flush().await?;

        debug!(
            batch_id = %batch.batch_id,
            records = batch.log_record_count(),
            "Wrote batch"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::batch::group;
    use crate::logs::{Attributes, Severity};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tempfile::TempDir;

    fn make_record(name: &str, severity: Severity) -> LogRecord {
        let mut attributes = Attributes::new();
        attributes.put("audit_trail.event.id", name);
        attributes.put("audit_trail.event.status_code", 200i64);

        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap(),
            event_name: name.to_string(),
            severity,
            body: Some("{}".to_string()),
            attributes,
        }
    }

    #[tokio::test]
    async fn test_file_sink_appends_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/audit.ndjson");

        let sink = JsonLinesSink::file(&path).await.unwrap();
        sink.consume(group(vec![
            ("instance", make_record("CreateServer", Severity::Success)),
            ("iam", make_record("DeleteUser", Severity::Failed)),
        ]))
        .await
        .unwrap();
        sink.consume(group(vec![(
            "instance",
            make_record("DeleteServer", Severity::Success),
        )]))
        .await
        .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event_name"], "CreateServer");
        assert_eq!(lines[0]["resource"]["service.name"], "instance");
        assert_eq!(lines[0]["timestamp"], "2025-03-04T10:00:00.000000000Z");
        assert_eq!(lines[1]["severity_text"], "failed");
        assert_eq!(lines[1]["severity_number"], 17);
        assert_eq!(lines[1]["attributes"]["audit_trail.event.status_code"], 200);
        assert_eq!(lines[2]["event_name"], "DeleteServer");
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("audit.ndjson");

        let sink = JsonLinesSink::file(&path).await.unwrap();
        sink.consume(crate::logs::BatchBuilder::new().build())
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.is_empty());
    }
}
