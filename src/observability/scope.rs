//! Begin/complete logging around one operation
//!
//! - Logs the begin event on creation
//! - Logs the complete or failed event with `elapsed_ms`
//! - Warns on drop if neither was called

use std::cell::Cell;
use std::time::Instant;

use super::events::Event;
use super::logger::Logger;

/// Scope around an export or restore.
///
/// ```ignore
/// let scope = ObservationScope::begin(Event::ExportStart, &[("path", "backup.json")]);
/// // ... work ...
/// scope.complete(Event::ExportComplete, &[("rows", "42")]);
/// ```
pub struct ObservationScope {
    name: &'static str,
    started: Instant,
    fields: Vec<(&'static str, String)>,
    finished: Cell<bool>,
}

impl ObservationScope {
    /// Log `event` and start timing
    pub fn begin(event: Event, fields: &[(&'static str, &str)]) -> Self {
        Logger::info(event.as_str(), fields);

        Self {
            name: event.as_str(),
            started: Instant::now(),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            finished: Cell::new(false),
        }
    }

    /// Milliseconds since the scope began
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Log `event` at INFO with the begin fields, `extra` and `elapsed_ms`
    pub fn complete(self, event: Event, extra: &[(&str, &str)]) {
        self.finished.set(true);
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = self.merged(extra);
        fields.push(("elapsed_ms", elapsed.as_str()));
        Logger::info(event.as_str(), &fields);
    }

    /// Log `event` at ERROR with the begin fields, `reason` and `elapsed_ms`
    pub fn fail(self, event: Event, reason: &str) {
        self.finished.set(true);
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = self.merged(&[]);
        fields.push(("reason", reason));
        fields.push(("elapsed_ms", elapsed.as_str()));
        Logger::error(event.as_str(), &fields);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    fn merged<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        self.fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(extra.iter().copied())
            .collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished.get() {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}
