pub mod batch;
pub mod record;
pub mod transform;

pub use batch::{BatchBuilder, LogBatch, ResourceLogs};
pub use record::{AttributeValue, Attributes, LogRecord, Severity};
pub use transform::{event_to_log_record, TransformError};
