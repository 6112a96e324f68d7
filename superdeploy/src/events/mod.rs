//! Event sinks for run lifecycle observability.
//!
//! A sink is handed to the orchestrator explicitly; there is no
//! process-wide default.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
