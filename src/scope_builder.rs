//! Builds the per-event [`Scope`] from a record's context.
//!
//! Reserved context keys are pulled out one by one, in a fixed order, and
//! whatever is left is attached as a single `log_context` extra. Every
//! step works on the already-shrunk context, so the order matters.

use crate::record::{stringify, ExceptionInfo, LogRecord};
use crate::scope::Scope;
use serde_json::{Map, Value};

pub const EXCEPTION_KEY: &str = "exception";
pub const EXTRA_KEY: &str = "extra";
pub const TAGS_KEY: &str = "tags";
pub const FINGERPRINT_KEY: &str = "fingerprint";
pub const USER_KEY: &str = "user";
pub const LOGGER_KEY: &str = "logger";
/// Extra under which the leftover context is reported.
pub const LOG_CONTEXT_KEY: &str = "log_context";

pub struct ScopeBuilder;

impl ScopeBuilder {
    /// Build a standalone scope for `record`.
    ///
    /// The record is not modified; the exception slot is consumed from a
    /// private copy of the context and is not part of the returned scope.
    pub fn build(record: &LogRecord) -> Scope {
        let mut context = record.context.clone();
        Self::take_exception(record, &mut context);

        let mut scope = Scope::default();
        Self::populate(&mut scope, context, record);
        scope
    }

    /// Remove the `exception` key from `context` and return the record's
    /// exception, if any.
    ///
    /// The typed slot on the record wins; a JSON `exception` value is only
    /// coerced when the slot is empty.
    pub fn take_exception(record: &LogRecord, context: &mut Map<String, Value>) -> Option<ExceptionInfo> {
        let from_context = context.remove(EXCEPTION_KEY);
        record
            .exception
            .clone()
            .or_else(|| from_context.as_ref().and_then(ExceptionInfo::from_value))
    }

    /// Fill `scope` from an exception-free `context` and the record's
    /// top-level `extra`. The logger name ends up in [`Scope::logger`].
    pub fn populate(scope: &mut Scope, mut context: Map<String, Value>, record: &LogRecord) {
        if let Some(Value::Object(extra)) = take_non_blank(&mut context, EXTRA_KEY) {
            for (key, value) in extra {
                scope.set_extra(key, value);
            }
        }

        if let Some(Value::Object(tags)) = take_non_blank(&mut context, TAGS_KEY) {
            for (key, value) in tags {
                scope.set_tag(key, stringify(&value));
            }
        }

        // Top-level extra overwrites same-named keys from `context.extra`.
        for (key, value) in &record.extra {
            scope.set_extra(key.clone(), value.clone());
        }

        if let Some(fingerprint) = take_non_blank(&mut context, FINGERPRINT_KEY) {
            let fingerprint = coerce_fingerprint(fingerprint);
            if !fingerprint.is_empty() {
                scope.set_fingerprint(fingerprint);
            }
        }

        if let Some(user) = take_non_blank(&mut context, USER_KEY) {
            if let Some(user) = coerce_user(user) {
                scope.set_user(user);
            }
        }

        let logger = context
            .remove(LOGGER_KEY)
            .filter(|value| !is_blank(value))
            .map(|value| stringify(&value))
            .unwrap_or_else(|| record.channel.clone());
        scope.logger = Some(logger);

        if !context.is_empty() {
            scope.set_extra(LOG_CONTEXT_KEY, Value::Object(context));
        }
    }
}

/// Remove `key` only when it holds something; empty values stay in the
/// context and are reported with the rest of it.
fn take_non_blank(context: &mut Map<String, Value>, key: &str) -> Option<Value> {
    if context.get(key).map_or(true, is_blank) {
        return None;
    }
    context.remove(key)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn coerce_fingerprint(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(stringify)
            .collect(),
        other if is_blank(&other) => Vec::new(),
        other => vec![stringify(&other)],
    }
}

/// Users are mappings; a bare scalar is taken to be the user id.
fn coerce_user(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) if !map.is_empty() => Some(map),
        Value::Object(_) | Value::Null | Value::Array(_) => None,
        Value::String(s) if s.is_empty() => None,
        scalar => {
            let mut map = Map::new();
            map.insert("id".to_string(), scalar);
            Some(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;
    use serde_json::json;

    fn record() -> LogRecord {
        LogRecord::new(level::ERROR, "app", "boom")
    }

    #[test]
    fn top_level_extra_overwrites_context_extra() {
        let record = record()
            .with_context("extra", json!({"a": 1, "b": 1}))
            .with_extra("a", 2);

        let scope = ScopeBuilder::build(&record);
        assert_eq!(scope.extras.get("a"), Some(&json!(2)));
        assert_eq!(scope.extras.get("b"), Some(&json!(1)));
        assert!(!scope.extras.contains_key(LOG_CONTEXT_KEY));
    }

    #[test]
    fn tags_are_stringified() {
        let record = record().with_context("tags", json!({"region": "eu", "shard": 3, "hot": true}));

        let scope = ScopeBuilder::build(&record);
        assert_eq!(scope.tags.get("region").map(String::as_str), Some("eu"));
        assert_eq!(scope.tags.get("shard").map(String::as_str), Some("3"));
        assert_eq!(scope.tags.get("hot").map(String::as_str), Some("true"));
    }

    #[test]
    fn logger_defaults_to_channel() {
        let scope = ScopeBuilder::build(&record());
        assert_eq!(scope.logger.as_deref(), Some("app"));

        let scope = ScopeBuilder::build(&record().with_context("logger", ""));
        assert_eq!(scope.logger.as_deref(), Some("app"));
        assert!(scope.extras.is_empty());

        let scope = ScopeBuilder::build(&record().with_context("logger", "billing"));
        assert_eq!(scope.logger.as_deref(), Some("billing"));
    }

    #[test]
    fn leftover_context_becomes_log_context() {
        let record = record()
            .with_context("order_id", 7)
            .with_context("user", json!({"id": "u1", "email": "a@b.c"}))
            .with_context("fingerprint", json!(["{{ default }}", "checkout"]))
            .with_context("exception", "stack overflow");

        let scope = ScopeBuilder::build(&record);
        assert_eq!(scope.extras.get(LOG_CONTEXT_KEY), Some(&json!({"order_id": 7})));
        assert_eq!(scope.user.get("email"), Some(&json!("a@b.c")));
        assert_eq!(scope.fingerprint, vec!["{{ default }}", "checkout"]);
    }

    #[test]
    fn malformed_reserved_values_are_coerced_or_dropped() {
        let record = record()
            .with_context("extra", "not a map")
            .with_context("tags", json!([1, 2]))
            .with_context("user", 42)
            .with_context("fingerprint", "single");

        let scope = ScopeBuilder::build(&record);
        assert!(scope.extras.is_empty());
        assert!(scope.tags.is_empty());
        assert_eq!(scope.user.get("id"), Some(&json!(42)));
        assert_eq!(scope.fingerprint, vec!["single"]);
    }

    #[test]
    fn empty_reserved_values_stay_in_log_context() {
        let record = record()
            .with_context("extra", json!({}))
            .with_context("tags", json!({}))
            .with_context("fingerprint", json!([]))
            .with_context("user", json!({}));

        let scope = ScopeBuilder::build(&record);
        assert_eq!(
            scope.extras.get(LOG_CONTEXT_KEY),
            Some(&json!({"extra": {}, "tags": {}, "fingerprint": [], "user": {}}))
        );
        assert!(scope.tags.is_empty());
        assert!(scope.fingerprint.is_empty());
        assert!(scope.user.is_empty());
    }

    #[test]
    fn exception_is_taken_before_anything_else() {
        let record = record().with_context("exception", json!({"type": "Timeout", "value": "5s"}));
        let mut context = record.context.clone();

        let exception = ScopeBuilder::take_exception(&record, &mut context);
        assert_eq!(exception, Some(ExceptionInfo::new("Timeout", "5s")));
        assert!(context.is_empty());
    }

    #[test]
    fn typed_exception_wins_over_context_value() {
        let record = record()
            .with_exception(ExceptionInfo::new("Io", "eof"))
            .with_context("exception", "ignored");
        let mut context = record.context.clone();

        let exception = ScopeBuilder::take_exception(&record, &mut context);
        assert_eq!(exception.map(|e| e.ty), Some("Io".to_string()));
        assert!(!context.contains_key(EXCEPTION_KEY));
    }
}
