use crate::backend::HubBuildError;
use crate::hub::{Capture, Hub};
use crate::level::Severity;
use crate::record::{stringify, ExceptionInfo};
use crate::scope::{Breadcrumb, Event, EventProcessor, Scope};
use chrono::{DateTime, Utc};
use sentry::protocol::{self, Exception, User};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// [`Hub`] backed by a `sentry::Hub`.
///
/// Each [`Hub::with_scope`] call runs on a hub forked from the wrapped
/// one, inside a single `sentry::Hub::with_scope` activation, so tags,
/// extras, user and fingerprint never leak into the base scope.
#[derive(Clone)]
pub struct SentryHub {
    hub: Arc<sentry::Hub>,
}

impl SentryHub {
    /// Wrap an existing hub, e.g. `sentry::Hub::current()`.
    pub fn new(hub: Arc<sentry::Hub>) -> Self {
        Self { hub }
    }

    /// Create a dedicated client and hub for `dsn`.
    ///
    /// The client uses the crate's default HTTP transport; environment and
    /// release are left to the handler.
    pub fn from_dsn(dsn: &str) -> Result<Self, HubBuildError> {
        let dsn = dsn
            .parse::<sentry::types::Dsn>()
            .map_err(|e| HubBuildError::InvalidSentryDsn(e.to_string()))?;

        let options = sentry::apply_defaults(sentry::ClientOptions {
            dsn: Some(dsn),
            ..Default::default()
        });
        let client = Arc::new(sentry::Client::from(options));
        let hub = sentry::Hub::new(Some(client), Arc::new(sentry::Scope::default()));

        Ok(Self::new(Arc::new(hub)))
    }

    pub fn inner(&self) -> &Arc<sentry::Hub> {
        &self.hub
    }

    /// Block until queued events are sent or `timeout` elapses.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.hub
            .client()
            .map(|client| client.flush(Some(timeout)))
            .unwrap_or(true)
    }
}

impl Hub for SentryHub {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.hub.add_breadcrumb(protocol::Breadcrumb {
            timestamp: breadcrumb
                .timestamp
                .map(SystemTime::from)
                .unwrap_or_else(SystemTime::now),
            category: Some(breadcrumb.category),
            level: to_sentry_level(breadcrumb.level),
            message: Some(breadcrumb.message),
            data: breadcrumb.data.into_iter().collect(),
            ..Default::default()
        });
    }

    fn with_scope(&self, configure: &mut dyn FnMut(&mut Scope) -> Capture) {
        let mut scope = Scope::default();
        let capture = configure(&mut scope);
        let processors = Arc::new(scope.take_event_processors());

        // A sentry hub's scope stack is shared by every thread using it;
        // fork one per call so concurrent activations cannot interleave.
        let hub = sentry::Hub::new_from_top(&self.hub);
        hub.with_scope(
            |sentry_scope| {
                for (key, value) in &scope.extras {
                    sentry_scope.set_extra(key, value.clone());
                }
                for (key, value) in &scope.tags {
                    sentry_scope.set_tag(key, value);
                }
                if !scope.fingerprint.is_empty() {
                    let parts: Vec<&str> = scope.fingerprint.iter().map(String::as_str).collect();
                    sentry_scope.set_fingerprint(Some(&parts[..]));
                }
                if !scope.user.is_empty() {
                    sentry_scope.set_user(Some(to_user(&scope.user)));
                }
                sentry_scope.add_event_processor(move |event| Some(run_processors(&processors, event)));
            },
            || match capture {
                Capture::Message(message) => {
                    hub.capture_message(&message, sentry::Level::Error);
                }
                Capture::Exception(exception) => {
                    hub.capture_event(exception_event(&exception));
                }
            },
        );
    }
}

/// Run bridge processors against the fields they are allowed to touch and
/// copy the result back onto the sentry event.
fn run_processors(
    processors: &[EventProcessor],
    mut event: protocol::Event<'static>,
) -> protocol::Event<'static> {
    let mut bridged = Event {
        level: Some(from_sentry_level(event.level)),
        logger: event.logger.clone(),
        environment: event.environment.as_ref().map(|e| e.to_string()),
        release: event.release.as_ref().map(|r| r.to_string()),
        timestamp: Some(DateTime::<Utc>::from(event.timestamp)),
        message: event.message.clone(),
        exception: None,
    };
    for processor in processors {
        processor(&mut bridged);
    }

    if let Some(level) = bridged.level {
        event.level = to_sentry_level(level);
    }
    event.logger = bridged.logger;
    event.environment = bridged.environment.map(Cow::Owned);
    event.release = bridged.release.map(Cow::Owned);
    if let Some(timestamp) = bridged.timestamp {
        event.timestamp = SystemTime::from(timestamp);
    }
    event
}

/// Sentry lists the root cause first and the outermost error last.
fn exception_event(exception: &ExceptionInfo) -> protocol::Event<'static> {
    let mut values: Vec<Exception> = exception
        .chain
        .iter()
        .rev()
        .map(|message| Exception {
            ty: "Error".to_string(),
            value: Some(message.clone()),
            ..Default::default()
        })
        .collect();
    values.push(Exception {
        ty: exception.ty.clone(),
        value: Some(exception.value.clone()),
        ..Default::default()
    });

    protocol::Event {
        exception: values.into(),
        level: sentry::Level::Error,
        ..Default::default()
    }
}

fn to_user(map: &Map<String, Value>) -> User {
    let mut user = User::default();
    for (key, value) in map {
        match key.as_str() {
            "id" => user.id = Some(stringify(value)),
            "email" => user.email = Some(stringify(value)),
            "username" => user.username = Some(stringify(value)),
            _ => {
                user.other.insert(key.clone(), value.clone());
            }
        }
    }
    user
}

fn to_sentry_level(severity: Severity) -> sentry::Level {
    match severity {
        Severity::Debug => sentry::Level::Debug,
        Severity::Info => sentry::Level::Info,
        Severity::Warning => sentry::Level::Warning,
        Severity::Error => sentry::Level::Error,
        Severity::Fatal => sentry::Level::Fatal,
    }
}

fn from_sentry_level(level: sentry::Level) -> Severity {
    match level {
        sentry::Level::Debug => Severity::Debug,
        sentry::Level::Info => Severity::Info,
        sentry::Level::Warning => Severity::Warning,
        sentry::Level::Error => Severity::Error,
        sentry::Level::Fatal => Severity::Fatal,
    }
}
