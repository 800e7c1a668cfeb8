use crate::handler::HandlerConfig;
use crate::hub::{Capture, Hub};
use crate::level::Severity;
use crate::record::LogRecord;
use crate::scope::Event;
use crate::scope_builder::ScopeBuilder;

/// Report one representative record to `hub`.
///
/// **Behavior**
/// - An exception-bearing record is dropped without touching the hub when
///   `config.report_exceptions` is off.
/// - Otherwise the scope is built, one event processor is registered and
///   the capture is dispatched, all inside a single
///   [`Hub::with_scope`] activation.
pub fn report(record: &LogRecord, config: &HandlerConfig, hub: &dyn Hub) {
    let mut context = record.context.clone();
    let exception = ScopeBuilder::take_exception(record, &mut context);

    if exception.is_some() && !config.report_exceptions {
        return;
    }

    hub.with_scope(&mut |scope| {
        ScopeBuilder::populate(scope, context.clone(), record);

        let defaults = EventDefaults {
            severity: Severity::from_level(record.level),
            logger: scope.logger.clone(),
            environment: config.environment.clone(),
            release: config.release.clone(),
            timestamp: record.datetime,
        };
        scope.add_event_processor(move |event| defaults.apply(event));

        match &exception {
            Some(exception) => Capture::Exception(exception.clone()),
            None => Capture::Message(message_text(record, config).to_string()),
        }
    });
}

/// Text sent for a message capture.
pub fn message_text<'a>(record: &'a LogRecord, config: &HandlerConfig) -> &'a str {
    if config.use_formatted_message || record.message.is_empty() {
        &record.formatted_message
    } else {
        &record.message
    }
}

/// Values the event processor stamps onto the outgoing event.
struct EventDefaults {
    severity: Severity,
    logger: Option<String>,
    environment: Option<String>,
    release: Option<String>,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl EventDefaults {
    fn apply(&self, event: &mut Event) {
        event.level = Some(self.severity);
        if self.logger.is_some() {
            event.logger = self.logger.clone();
        }
        // Never overwrite values set upstream, e.g. by the hub's own options.
        if event.environment.is_none() {
            event.environment = self.environment.clone();
        }
        if event.release.is_none() {
            event.release = self.release.clone();
        }
        if let Some(timestamp) = self.timestamp {
            event.timestamp = Some(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;
    use crate::memory_hub::MemoryHub;
    use crate::record::ExceptionInfo;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn config() -> HandlerConfig {
        HandlerConfig {
            environment: Some("staging".into()),
            release: Some("1.2.3".into()),
            ..HandlerConfig::default()
        }
    }

    #[test]
    fn disabled_exceptions_make_no_hub_calls() {
        let hub = MemoryHub::new();
        let config = HandlerConfig {
            report_exceptions: false,
            ..config()
        };
        let record = LogRecord::new(level::ERROR, "app", "boom")
            .with_exception(ExceptionInfo::new("Io", "eof"));

        report(&record, &config, &hub);
        assert_eq!(hub.scope_activations(), 0);
        assert!(hub.captured().is_empty());
    }

    #[test]
    fn exception_is_captured_as_exception() {
        let hub = MemoryHub::new();
        let record = LogRecord::new(level::CRITICAL, "app", "boom")
            .with_context("exception", json!({"type": "Io", "value": "eof"}));

        report(&record, &config(), &hub);
        let captured = hub.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].capture, Capture::Exception(ExceptionInfo::new("Io", "eof")));
        assert_eq!(captured[0].event.level, Some(Severity::Fatal));
        assert!(!captured[0].extras.contains_key("log_context"));
    }

    #[test]
    fn message_prefers_raw_message_unless_configured() {
        let record = LogRecord::new(level::ERROR, "app", "raw").with_formatted_message("formatted");
        assert_eq!(message_text(&record, &config()), "raw");

        let formatted = HandlerConfig {
            use_formatted_message: true,
            ..config()
        };
        assert_eq!(message_text(&record, &formatted), "formatted");

        let empty = LogRecord::new(level::ERROR, "app", "").with_formatted_message("fallback");
        assert_eq!(message_text(&empty, &config()), "fallback");
    }

    #[test]
    fn processor_stamps_event() {
        let hub = MemoryHub::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single();
        let record = LogRecord::new(level::NOTICE, "billing", "charged")
            .with_datetime(at)
            .with_context("tags", json!({"plan": "pro"}));

        report(&record, &config(), &hub);
        let captured = hub.captured();
        let event = &captured[0].event;
        assert_eq!(event.level, Some(Severity::Info));
        assert_eq!(event.logger.as_deref(), Some("billing"));
        assert_eq!(event.environment.as_deref(), Some("staging"));
        assert_eq!(event.release.as_deref(), Some("1.2.3"));
        assert_eq!(event.timestamp, at);
        assert_eq!(event.message.as_deref(), Some("charged"));
        assert_eq!(captured[0].tags.get("plan").map(String::as_str), Some("pro"));
    }

    #[test]
    fn upstream_environment_and_release_win() {
        let hub = MemoryHub::new()
            .with_environment("production")
            .with_release("9.9.9");
        let record = LogRecord::new(level::ERROR, "app", "boom");

        report(&record, &config(), &hub);
        let other = HandlerConfig {
            environment: Some("dev".into()),
            release: Some("0.0.1".into()),
            ..config()
        };
        report(&record, &other, &hub);

        for captured in hub.captured() {
            assert_eq!(captured.event.environment.as_deref(), Some("production"));
            assert_eq!(captured.event.release.as_deref(), Some("9.9.9"));
        }
    }

    #[test]
    fn defaults_applied_twice_keep_first_values() {
        let defaults = |environment: &str, release: &str| EventDefaults {
            severity: Severity::Error,
            logger: None,
            environment: Some(environment.to_string()),
            release: Some(release.to_string()),
            timestamp: None,
        };

        let mut event = Event::default();
        defaults("staging", "1.2.3").apply(&mut event);
        defaults("dev", "0.0.1").apply(&mut event);

        assert_eq!(event.environment.as_deref(), Some("staging"));
        assert_eq!(event.release.as_deref(), Some("1.2.3"));
        assert_eq!(event.timestamp, None);
    }
}
