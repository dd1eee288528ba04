pub mod http;
pub mod traits;

pub use http::AuditTrailClient;
pub use traits::{ClientError, EventSource};
