use crate::logs::record::{Attributes, LogRecord};
use std::collections::HashMap;
use uuid::Uuid;

pub const SERVICE_NAME_KEY: &str = "service.name";
pub const SCOPE_NAME: &str = env!("CARGO_PKG_NAME");

/// Records of one originating service.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLogs {
    pub service_name: String,
    /// Resource attributes, carries `service.name`
    pub resource: Attributes,
    pub scope_name: &'static str,
    pub records: Vec<LogRecord>,
}

impl ResourceLogs {
    fn new(service_name: String) -> Self {
        let mut resource = Attributes::new();
        resource.put(SERVICE_NAME_KEY, service_name.as_str());

        Self {
            service_name,
            resource,
            scope_name: SCOPE_NAME,
            records: Vec::new(),
        }
    }
}

/// Log records produced by one poll, grouped by service name.
#[derive(Debug, Clone, PartialEq)]
pub struct LogBatch {
    /// Unique batch ID (for tracing a batch through the sink)
    pub batch_id: Uuid,

    /// Groups in first-seen order of their service name
    resource_logs: Vec<ResourceLogs>,
}

impl LogBatch {
    pub fn resource_logs(&self) -> &[ResourceLogs] {
        &self.resource_logs
    }

    pub fn log_record_count(&self) -> usize {
        self.resource_logs.iter().map(|rl| rl.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.log_record_count() == 0
    }

    /// All records with their service name, group by group.
    pub fn records(&self) -> impl Iterator<Item = (&str, &LogRecord)> {
        self.resource_logs.iter().flat_map(|rl| {
            rl.records
                .iter()
                .map(move |record| (rl.service_name.as_str(), record))
        })
    }
}

/// Accumulates records into a [`LogBatch`].
///
/// A group is created the first time its service name is pushed; later
/// records for the same service are appended to that group.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    resource_logs: Vec<ResourceLogs>,
    index: HashMap<String, usize>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, service_name: &str, record: LogRecord) {
        let idx = match self.index.get(service_name) {
            Some(&idx) => idx,
            None => {
                let idx = self.resource_logs.len();
                self.resource_logs
                    .push(ResourceLogs::new(service_name.to_string()));
                self.index.insert(service_name.to_string(), idx);
                idx
            }
        };

        self.resource_logs[idx].records.push(record);
    }

    pub fn len(&self) -> usize {
        self.resource_logs.iter().map(|rl| rl.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build(self) -> LogBatch {
        LogBatch {
            batch_id: Uuid::new_v4(),
            resource_logs: self.resource_logs,
        }
    }
}

/// Group `(service name, record)` pairs into one batch.
pub fn group<I, S>(records: I) -> LogBatch
where
    I: IntoIterator<Item = (S, LogRecord)>,
    S: AsRef<str>,
{
    let mut builder = BatchBuilder::new();
    for (service_name, record) in records {
        builder.push(service_name.as_ref(), record);
    }
    builder.build()
}
