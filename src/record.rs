use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;

/// One structured log entry as delivered by the host logging subsystem.
///
/// The core treats records as read-only; whenever it needs to shrink the
/// context it works on a clone.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub level: i32,
    pub channel: String,
    pub message: String,
    pub formatted_message: String,
    pub datetime: Option<DateTime<Utc>>,
    pub context: Map<String, Value>,
    pub extra: Map<String, Value>,
    /// Typed slot for the reserved `exception` context key.
    pub exception: Option<ExceptionInfo>,
}

impl LogRecord {
    pub fn new(level: i32, channel: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            channel: channel.into(),
            message: message.into(),
            formatted_message: String::new(),
            datetime: Some(Utc::now()),
            context: Map::new(),
            extra: Map::new(),
            exception: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_datetime(mut self, datetime: Option<DateTime<Utc>>) -> Self {
        self.datetime = datetime;
        self
    }

    pub fn with_formatted_message(mut self, formatted: impl Into<String>) -> Self {
        self.formatted_message = formatted.into();
        self
    }
}

/// Owned snapshot of an error and its source chain.
///
/// `tracing` only lends errors to visitors for the duration of a call, so
/// the layer captures the parts an error tracker needs up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    pub ty: String,
    pub value: String,
    /// Messages of `source()` errors, outermost first.
    pub chain: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        ExceptionInfo {
            ty: ty.into(),
            value: value.into(),
            chain: Vec::new(),
        }
    }

    /// Capture an error trait object together with its sources.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(inner) = source {
            chain.push(inner.to_string());
            source = inner.source();
        }

        ExceptionInfo {
            ty: error_type_name(error),
            value: error.to_string(),
            chain,
        }
    }

    /// Best-effort coercion of a JSON `exception` context value.
    ///
    /// Objects may carry `type`/`value` (or `message`); any other value is
    /// rendered as the exception message. `null` yields nothing.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(ExceptionInfo::new("Error", s.clone())),
            Value::Object(map) => {
                let ty = map
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("Error")
                    .to_string();
                let value = map
                    .get("value")
                    .or_else(|| map.get("message"))
                    .map(stringify)
                    .unwrap_or_else(|| value.to_string());
                Some(ExceptionInfo::new(ty, value))
            }
            other => Some(ExceptionInfo::new("Error", other.to_string())),
        }
    }
}

/// The `Debug` output of most error types starts with the type name
/// (`Custom { .. }`, `ParseIntError { .. }`); use that as the reported type.
fn error_type_name(error: &dyn Error) -> String {
    let debug = format!("{:?}", error);
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        "Error".to_string()
    } else {
        name
    }
}

/// Render a JSON value as plain text: strings unquoted, everything else as JSON.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
