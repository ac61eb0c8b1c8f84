// Job search: text filtering, radius filtering, and the map feed.
// Geocoding happens in `service`; `ranker` stays pure so it can be tested without I/O.

pub mod handlers;
pub mod query;
pub mod ranker;
pub mod service;
