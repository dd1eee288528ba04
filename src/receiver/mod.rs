pub mod lifecycle;
pub mod poller;

pub use lifecycle::{AuditTrailReceiver, LifecycleState, ReceiverError};
pub use poller::{PollError, PollSummary, Poller, PollerSettings};
