use crate::handler::ErrorTrackingHandler;
use crate::level::{self, LevelRank};
use crate::record::{ExceptionInfo, LogRecord};
use crate::scope_builder::{EXTRA_KEY, TAGS_KEY, USER_KEY};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// How records reach the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Every event is handled on the emitting thread via
    /// [`ErrorTrackingHandler::handle`].
    Immediate,
    /// Events are queued and flushed as batches via
    /// [`ErrorTrackingHandler::handle_batch`] from a background task.
    Buffered {
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    },
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// feeds them to an [`ErrorTrackingHandler`].
///
/// Events below both the handler's minimum level and its breadcrumb level
/// are skipped before any field is visited.
pub struct BridgeLayer {
    handler: Arc<ErrorTrackingHandler>,
    sender: Option<mpsc::Sender<LogRecord>>,
    threshold: i32,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Records accepted for handling (handled inline or enqueued).
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed.
    pub dropped_events: Arc<AtomicU64>,
}

impl BridgeLayer {
    /// Create a new layer.
    ///
    /// With [`Delivery::Buffered`] a background task is spawned on the
    /// current Tokio runtime that pulls records from a bounded channel and
    /// flushes them as batches. Minimal thresholds are enforced for
    /// `buffer`, `batch_size` and `flush_interval` to avoid degenerate
    /// configurations. Without a runtime the layer falls back to
    /// [`Delivery::Immediate`].
    pub fn new(handler: Arc<ErrorTrackingHandler>, delivery: Delivery) -> (Self, Option<JoinHandle<()>>) {
        let config = handler.config();
        let threshold = config
            .breadcrumb_level
            .map_or(config.minimum_level, |b| b.min(config.minimum_level));

        let mut layer = Self {
            handler,
            sender: None,
            threshold,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        };

        let Delivery::Buffered { buffer, batch_size, flush_interval } = delivery else {
            return (layer, None);
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                eprintln!("no tokio runtime available, error bridge falls back to immediate delivery");
                return (layer, None);
            }
        };

        // Enforce minimal thresholds to avoid degenerate configs.
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);
        layer.sender = Some(tx);

        let handler = Arc::clone(&layer.handler);
        let handle = runtime.spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(record) => {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                handler.handle_batch(std::mem::take(&mut batch));
                            }
                        }
                        None => {
                            if !batch.is_empty() {
                                handler.handle_batch(std::mem::take(&mut batch));
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            handler.handle_batch(std::mem::take(&mut batch));
                        }
                    }
                }
            }
        });

        (layer, Some(handle))
    }

    pub fn handler(&self) -> &Arc<ErrorTrackingHandler> {
        &self.handler
    }

    fn dispatch(&self, record: LogRecord) {
        match &self.sender {
            None => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
                self.handler.handle(record);
            }
            Some(sender) => match sender.try_send(record) {
                Ok(()) => {
                    self.enqueued_events.fetch_add(1, Ordering::Relaxed);
                }
                Err(_e) => {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    eprintln!("error bridge channel full, dropping log record");
                }
            },
        }
    }
}

impl<S> Layer<S> for BridgeLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let base_level = level::from_tracing(meta.level());
        // A `severity` field may move the rank, so only events without one
        // can be cut before visiting fields.
        if base_level < self.threshold && !has_severity_field(event) {
            return;
        }

        let record = record_from_event(event);
        if record.level < self.threshold {
            return;
        }
        self.dispatch(record);
    }
}

fn has_severity_field(event: &Event) -> bool {
    event.metadata().fields().field(SEVERITY_FIELD).is_some()
}

/// Field that overrides the rank derived from the tracing level.
pub const SEVERITY_FIELD: &str = "severity";

/// Convert a tracing event into a [`LogRecord`].
pub fn record_from_event(event: &Event) -> LogRecord {
    let meta = event.metadata();

    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    let mut extra = Map::new();
    if let Some(module_path) = meta.module_path() {
        extra.insert("module_path".to_string(), Value::from(module_path));
    }
    if let Some(file) = meta.file() {
        extra.insert("file".to_string(), Value::from(file));
    }
    if let Some(line) = meta.line() {
        extra.insert("line".to_string(), Value::from(line));
    }

    LogRecord {
        level: visitor.level.unwrap_or_else(|| level::from_tracing(meta.level())),
        channel: meta.target().to_string(),
        message: visitor.message.unwrap_or_default(),
        formatted_message: String::new(),
        datetime: Some(Utc::now()),
        context: visitor.context,
        extra,
        exception: visitor.exception,
    }
}

/// Collects event fields into a record context.
///
/// Dotted `tags.*`, `user.*` and `extra.*` fields are grouped under the
/// matching reserved key; `log.*` fields added by `tracing-log` are
/// skipped.
#[derive(Default)]
pub struct FieldVisitor {
    pub context: Map<String, Value>,
    pub message: Option<String>,
    pub level: Option<i32>,
    pub exception: Option<ExceptionInfo>,
}

impl FieldVisitor {
    fn insert(&mut self, name: &str, value: Value) {
        if name.starts_with("log.") {
            return;
        }

        if name == SEVERITY_FIELD {
            let rank = match &value {
                Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
                Value::String(s) => s.parse::<LevelRank>().ok().map(|r| r.0),
                _ => None,
            };
            if rank.is_some() {
                self.level = rank;
                return;
            }
        }

        for group in [TAGS_KEY, USER_KEY, EXTRA_KEY] {
            if let Some(key) = name.strip_prefix(group).and_then(|rest| rest.strip_prefix('.')) {
                self.insert_grouped(group, key.to_string(), value, true);
                return;
            }
            // A plain scalar next to dotted fields of the same group joins
            // the map instead of replacing it.
            if name == group
                && !value.is_object()
                && self.context.get(group).map_or(false, Value::is_object)
            {
                self.insert_grouped(group, scalar_key(group), value, false);
                return;
            }
        }

        self.context.insert(name.to_string(), value);
    }

    /// Insert `key` into a dotted field group, promoting an earlier plain
    /// value of the same name into the group map.
    fn insert_grouped(&mut self, group: &str, key: String, value: Value, overwrite: bool) {
        let mut map = match self.context.remove(group) {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(plain) => {
                let mut map = Map::new();
                map.insert(scalar_key(group), plain);
                map
            }
        };
        if overwrite || !map.contains_key(&key) {
            map.insert(key, value);
        }
        self.context.insert(group.to_string(), Value::Object(map));
    }
}

/// Key a plain group value is kept under once the group becomes a map.
fn scalar_key(group: &str) -> String {
    if group == USER_KEY { "id" } else { "value" }.to_string()
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field.name(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.exception.is_none() {
            self.exception = Some(ExceptionInfo::from_error(value));
        } else {
            self.insert(field.name(), Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field.name(), Value::String(format!("{:?}", value)));
        }
    }
}
