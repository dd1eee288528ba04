pub mod json_lines;
pub mod traits;

pub use json_lines::JsonLinesSink;
pub use traits::{LogSink, SinkError};
