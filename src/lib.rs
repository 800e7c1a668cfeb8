//! Bridge from structured logging to an error-tracking backend.
//!
//! Records are filtered, a batch is reduced to its highest-level record,
//! a per-event [`Scope`](scope::Scope) is built from the record context
//! (tags, extras, user, fingerprint, logger) and the result is captured
//! through an injected [`Hub`](hub::Hub).

pub mod level;
pub mod record;
pub mod scope;
pub mod hub;
pub mod scope_builder;
pub mod filter;
pub mod batch;
pub mod formatter;
pub mod reporter;
pub mod handler;
pub mod memory_hub;

#[cfg(feature = "sentry")]
pub mod sentry_hub;

pub mod backend;
pub mod env;
pub mod layer;
pub mod init;

pub use handler::{ErrorTrackingHandler, HandlerConfig};
pub use hub::{Capture, Hub};
pub use record::{ExceptionInfo, LogRecord};
