use crate::hub::{Capture, Hub};
use crate::scope::{Breadcrumb, Event, Scope};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Breadcrumbs kept before the oldest ones are evicted.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// Snapshot of one capture, with the scope and processors already applied.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    pub event: Event,
    #[serde(skip)]
    pub capture: Capture,
    pub extras: Map<String, Value>,
    pub tags: BTreeMap<String, String>,
    pub fingerprint: Vec<String>,
    pub user: Map<String, Value>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// In-process [`Hub`] that keeps everything it is given.
///
/// Useful for tests and for hosts that want to inspect what would have
/// been reported. `environment`/`release` presets behave like options set
/// on a real client: they are on the event before any processor runs.
#[derive(Debug, Default)]
pub struct MemoryHub {
    environment: Option<String>,
    release: Option<String>,
    max_breadcrumbs: Option<usize>,
    breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
    captured: Mutex<Vec<CapturedEvent>>,
    activations: AtomicUsize,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_max_breadcrumbs(mut self, max: usize) -> Self {
        self.max_breadcrumbs = Some(max);
        self
    }

    /// Everything captured so far, oldest first.
    pub fn captured(&self) -> Vec<CapturedEvent> {
        lock(&self.captured).clone()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        lock(&self.breadcrumbs).iter().cloned().collect()
    }

    /// Number of `with_scope` calls received, captured or not.
    pub fn scope_activations(&self) -> usize {
        self.activations.load(Ordering::Relaxed)
    }

    fn new_event(&self, capture: &Capture) -> Event {
        let (message, exception) = match capture {
            Capture::Message(message) => (Some(message.clone()), None),
            Capture::Exception(exception) => (None, Some(exception.clone())),
        };

        Event {
            level: None,
            logger: None,
            environment: self.environment.clone(),
            release: self.release.clone(),
            timestamp: Some(Utc::now()),
            message,
            exception,
        }
    }
}

impl Hub for MemoryHub {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        let max = self.max_breadcrumbs.unwrap_or(DEFAULT_MAX_BREADCRUMBS);
        if max == 0 {
            return;
        }

        let mut breadcrumbs = lock(&self.breadcrumbs);
        while breadcrumbs.len() >= max {
            breadcrumbs.pop_front();
        }
        breadcrumbs.push_back(breadcrumb);
    }

    fn with_scope(&self, configure: &mut dyn FnMut(&mut Scope) -> Capture) {
        self.activations.fetch_add(1, Ordering::Relaxed);

        let mut scope = Scope::default();
        let capture = configure(&mut scope);

        let mut event = self.new_event(&capture);
        scope.apply_to_event(&mut event);

        let captured = CapturedEvent {
            event,
            capture,
            extras: scope.extras,
            tags: scope.tags,
            fingerprint: scope.fingerprint,
            user: scope.user,
            breadcrumbs: self.breadcrumbs(),
        };
        lock(&self.captured).push(captured);
    }
}

/// A hub that drops everything.
///
/// Scopes are still configured, so the bridge's own overhead can be
/// measured without any transport behind it.
#[derive(Clone, Debug, Default)]
pub struct NoopHub;

impl Hub for NoopHub {
    fn add_breadcrumb(&self, _breadcrumb: Breadcrumb) {}

    fn with_scope(&self, configure: &mut dyn FnMut(&mut Scope) -> Capture) {
        let mut scope = Scope::default();
        let _ = configure(&mut scope);
    }
}

/// A poisoned lock only means another test thread panicked mid-push;
/// the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
