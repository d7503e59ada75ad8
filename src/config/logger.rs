//! Mapper logger
//!
//! The logger handed to the mapping layer is configurable at runtime. When
//! nothing is configured it resolves to the host's logger or, without a host
//! logger, to [`JsonLogger::stdout`]:
//! - One JSON object per line
//! - `event`, `severity`, `ts` first, then fields sorted by key
//! - Synchronous, write failures ignored

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything that can receive info-level mapper events.
pub trait Logger: Send + Sync {
    /// Log an event with the given severity and fields
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]);

    /// Log at INFO level
    fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}

/// The embedding application, which may bring its own logger.
pub trait HostEnvironment: Send + Sync {
    /// Host logger, if the host exposes one
    fn logger(&self) -> Option<Arc<dyn Logger>>;
}

/// Requested change to the configured logger.
#[derive(Clone)]
pub enum LoggerSetting {
    /// Clear the logger; the next resolution falls back to the default
    Disabled,
    /// Resolve and cache the default logger now
    Default,
    /// Use this logger
    Custom(Arc<dyn Logger>),
    /// Not a logger; the request is dropped
    Ignored,
}

impl fmt::Debug for LoggerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerSetting::Disabled => write!(f, "Disabled"),
            LoggerSetting::Default => write!(f, "Default"),
            LoggerSetting::Custom(_) => write!(f, "Custom(..)"),
            LoggerSetting::Ignored => write!(f, "Ignored"),
        }
    }
}

impl From<Value> for LoggerSetting {
    /// `false`/`null` disable, `true` selects the default, anything else is
    /// not a logger.
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => LoggerSetting::Disabled,
            Value::Bool(true) => LoggerSetting::Default,
            _ => LoggerSetting::Ignored,
        }
    }
}

impl From<Arc<dyn Logger>> for LoggerSetting {
    fn from(logger: Arc<dyn Logger>) -> Self {
        LoggerSetting::Custom(logger)
    }
}

/// JSON-lines logger writing to any sink.
pub struct JsonLogger {
    writer: Mutex<Box<dyn Write + Send>>,
    min_severity: Severity,
}

impl JsonLogger {
    /// Logger writing to `writer`
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            min_severity: Severity::Debug,
        }
    }

    /// Logger writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Drop events below `severity`
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Render one log line, including the trailing newline
    pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut record = Map::new();
        record.insert("event".into(), Value::String(event.to_string()));
        record.insert("severity".into(), Value::String(severity.as_str().to_string()));
        record.insert(
            "ts".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);
        for (key, value) in sorted_fields {
            record.insert((*key).to_string(), Value::String((*value).to_string()));
        }

        let mut line = Value::Object(record).to_string();
        line.push('\n');
        line
    }
}

impl Logger for JsonLogger {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }
        let line = Self::format_line(severity, event, fields);
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(line.as_bytes());
            let _ = writer.flush();
        }
    }
}

impl fmt::Debug for JsonLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLogger")
            .field("min_severity", &self.min_severity)
            .finish()
    }
}
