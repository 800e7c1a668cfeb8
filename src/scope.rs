use crate::level::Severity;
use crate::record::ExceptionInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Callback that adjusts an [`Event`] at dispatch time.
pub type EventProcessor = Box<dyn Fn(&mut Event) + Send + Sync>;

/// Transient, per-event contextual state.
///
/// A scope is built for exactly one reported record, lent to the hub for
/// the duration of one [`Hub::with_scope`](crate::hub::Hub::with_scope)
/// call and dropped afterwards.
#[derive(Default)]
pub struct Scope {
    pub extras: Map<String, Value>,
    pub tags: BTreeMap<String, String>,
    pub fingerprint: Vec<String>,
    pub user: Map<String, Value>,
    pub logger: Option<String>,
    event_processors: Vec<EventProcessor>,
}

impl Scope {
    pub fn set_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extras.insert(key.into(), value);
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn set_fingerprint(&mut self, fingerprint: Vec<String>) {
        self.fingerprint = fingerprint;
    }

    pub fn set_user(&mut self, user: Map<String, Value>) {
        self.user = user;
    }

    pub fn add_event_processor<F>(&mut self, processor: F)
    where
        F: Fn(&mut Event) + Send + Sync + 'static,
    {
        self.event_processors.push(Box::new(processor));
    }

    /// Hand the registered processors over, e.g. to a hub that defers them.
    pub fn take_event_processors(&mut self) -> Vec<EventProcessor> {
        std::mem::take(&mut self.event_processors)
    }

    /// Run every registered processor against `event`, in registration order.
    pub fn apply_to_event(&self, event: &mut Event) {
        for processor in &self.event_processors {
            processor(event);
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("extras", &self.extras)
            .field("tags", &self.tags)
            .field("fingerprint", &self.fingerprint)
            .field("user", &self.user)
            .field("logger", &self.logger)
            .field("event_processors", &self.event_processors.len())
            .finish()
    }
}

/// Report object handed to event processors.
///
/// Hubs create it at dispatch time, possibly with `environment` and
/// `release` already filled in from their own configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    pub level: Option<Severity>,
    pub logger: Option<String>,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub exception: Option<ExceptionInfo>,
}

/// Lightweight trail entry recorded for later inclusion in an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breadcrumb {
    pub timestamp: Option<DateTime<Utc>>,
    pub category: String,
    pub level: Severity,
    pub message: String,
    pub data: Map<String, Value>,
}
