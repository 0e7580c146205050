//! Observability for squema
//!
//! Structured single-line JSON logs with typed events:
//! - Schema lifecycle events (class registered, declaration loaded,
//!   policy built) are emitted at TRACE
//! - CLI command events are emitted at INFO
//! - Errors are returned to callers, never logged by the schema core
//!
//! TRACE output is suppressed unless the threshold is lowered.
//!
//! # Usage
//!
//! ```ignore
//! use squema::observability::{Logger, Severity, Event, log_event_with_fields};
//!
//! Logger::set_min_severity(Severity::Trace);
//! log_event_with_fields(Event::ClassRegistered, &[("class", "Point")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at the event's own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Suppressed at the default threshold; verifies no panic
        log_event(Event::ClassRegistered);
        log_event(Event::PolicyBuilt);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::DeclarationLoaded, &[("class", "Point")]);
    }
}
