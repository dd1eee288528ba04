pub mod types;

pub use types::{Event, EventPrincipal, ListEventsRequest, ListEventsResponse, OrderBy, Resource};
