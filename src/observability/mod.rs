//! Observability for relsnap
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Begin/complete scopes with elapsed time
//!
//! Observability is read-only: a failure to log never fails an export or
//! restore.
//!
//! ```ignore
//! use relsnap::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::TableRestored, &[("table", "user"), ("rows", "42")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields.
///
/// Per-table events go out at TRACE, failures at ERROR, the rest at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else if event.is_detail() {
        Severity::Trace
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::CatalogLoaded);
        log_event(Event::RestoreComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("database", "/tmp/test.sqlite")]);
    }
}
