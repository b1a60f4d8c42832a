//! Bridges host framework log records onto the active span.
//!
//! The host feeds every emitted log record into [`LogWatcher::record`].
//! Records at or above the configured minimum level become events on
//! whatever span is current in the context at that moment; records emitted
//! outside any span are dropped.

use std::env;

use opentelemetry::{otel_warn, trace::TraceContextExt, Context, KeyValue};
use serde_json::{Map, Value};

/// Environment variable holding the minimum level forwarded to spans.
///
/// Accepts one of the eight level names, case-insensitive. Unset or
/// unrecognized values fall back to [`LogLevel::Info`].
pub const OTEL_LOG_LEVEL: &str = "OTEL_LOG_LEVEL";

const LEVEL_ATTRIBUTE: &str = "level";
const CONTEXT_ATTRIBUTE: &str = "context";

/// Log severity scale, ordered ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Detailed debug information.
    Debug,
    /// Interesting events.
    Info,
    /// Normal but significant events.
    Notice,
    /// Exceptional occurrences that are not errors.
    Warning,
    /// Runtime errors that do not require immediate action.
    Error,
    /// Critical conditions.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// System is unusable.
    Emergency,
}

impl LogLevel {
    /// Look up a level by name, case-insensitive.
    ///
    /// Returns `None` for names outside the fixed scale; callers decide how
    /// to treat those.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "notice" => Some(LogLevel::Notice),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            "critical" => Some(LogLevel::Critical),
            "alert" => Some(LogLevel::Alert),
            "emergency" => Some(LogLevel::Emergency),
            _ => None,
        }
    }

    /// Read the configured minimum level from [`OTEL_LOG_LEVEL`], falling
    /// back to `Info` when unset or unrecognized.
    pub fn from_env() -> Self {
        match env::var(OTEL_LOG_LEVEL) {
            Ok(value) => LogLevel::parse(&value).unwrap_or_else(|| {
                otel_warn!(name: "LogWatcher.InvalidLogLevel", value = value.as_str());
                LogLevel::Info
            }),
            Err(_) => LogLevel::Info,
        }
    }
}

/// A borrowed view of one host log record.
///
/// The level is carried by name rather than as [`LogLevel`] so that custom
/// host levels outside the fixed scale survive the trip onto the span.
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    /// Level name as the host emitted it.
    pub level: &'a str,
    /// Log message; becomes the span event name.
    pub message: &'a str,
    /// Free-form structured context attached to the record.
    pub context: &'a Map<String, Value>,
}

impl<'a> LogRecord<'a> {
    /// Build a record from its parts.
    pub fn new(level: &'a str, message: &'a str, context: &'a Map<String, Value>) -> Self {
        LogRecord {
            level,
            message,
            context,
        }
    }
}

/// Forwards log records as events on the currently active span.
#[derive(Debug, Clone)]
pub struct LogWatcher {
    min_level: LogLevel,
}

impl LogWatcher {
    /// Create a watcher with the minimum level taken from [`OTEL_LOG_LEVEL`].
    pub fn new() -> Self {
        Self::with_min_level(LogLevel::from_env())
    }

    /// Create a watcher with an explicit minimum level.
    pub fn with_min_level(min_level: LogLevel) -> Self {
        LogWatcher { min_level }
    }

    /// The configured minimum level.
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Append `record` as an event on the currently active span.
    ///
    /// Records on the fixed scale below the minimum level are discarded.
    /// Records with a level name outside the scale always pass the filter:
    /// custom host levels must not be silently lost. Records arriving while
    /// no span is active are dropped.
    pub fn record(&self, record: &LogRecord<'_>) {
        if let Some(level) = LogLevel::parse(record.level) {
            if level < self.min_level {
                return;
            }
        }

        let attributes = vec![
            KeyValue::new(LEVEL_ATTRIBUTE, record.level.to_owned()),
            KeyValue::new(CONTEXT_ATTRIBUTE, serialize_context(record.context)),
        ];
        let message = record.message.to_owned();

        Context::map_current(|cx| {
            if cx.has_active_span() {
                cx.span().add_event(message, attributes);
            }
        });
    }
}

impl Default for LogWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact JSON form of the record context, with empty entries removed.
fn serialize_context(context: &Map<String, Value>) -> String {
    let filtered: Map<String, Value> = context
        .iter()
        .filter(|(_, value)| !is_empty_value(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(filtered).to_string()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(value) => !value,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(value) => value.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}
