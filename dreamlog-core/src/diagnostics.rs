//! Where the pipeline reports what it did.
//!
//! The core never picks a log destination on its own. Callers hand a sink to
//! [`crate::parse_with_sink`]; [`crate::parse`] uses [`NoopSink`].
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsRefStr, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// A leveled message receiver.
///
/// `category` names the pipeline stage (`sanitize`, `scanner`, `builder`,
/// `validate`, `parser`). Implementations must not fail.
pub trait DiagnosticsSink {
    fn log(&self, level: Level, category: &str, message: &str, payload: Option<&Value>);

    fn debug(&self, category: &str, message: &str) {
        self.log(Level::Debug, category, message, None);
    }

    fn info(&self, category: &str, message: &str) {
        self.log(Level::Info, category, message, None);
    }

    fn warn(&self, category: &str, message: &str) {
        self.log(Level::Warn, category, message, None);
    }

    fn error(&self, category: &str, message: &str) {
        self.log(Level::Error, category, message, None);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn log(&self, _level: Level, _category: &str, _message: &str, _payload: Option<&Value>) {}
}

/// Forwards to the `tracing` macros, with the category and payload as fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: Level, category: &str, message: &str, payload: Option<&Value>) {
        let payload = payload.map(Value::to_string).unwrap_or_default();
        match level {
            Level::Debug => tracing::debug!(category, payload = %payload, "{message}"),
            Level::Info => tracing::info!(category, payload = %payload, "{message}"),
            Level::Warn => tracing::warn!(category, payload = %payload, "{message}"),
            Level::Error => tracing::error!(category, payload = %payload, "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything logged so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        match self.records.lock() {
            Ok(mut records) => std::mem::take(&mut *records),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count_at(&self, level: Level) -> usize {
        match self.records.lock() {
            Ok(records) => records.iter().filter(|d| d.level == level).count(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .filter(|d| d.level == level)
                .count(),
        }
    }
}

impl DiagnosticsSink for CollectingSink {
    fn log(&self, level: Level, category: &str, message: &str, payload: Option<&Value>) {
        let diagnostic = Diagnostic {
            level,
            category: category.to_string(),
            message: message.to_string(),
            payload: payload.cloned(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
