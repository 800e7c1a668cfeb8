use crate::record::ExceptionInfo;
use crate::scope::{Breadcrumb, Scope};

/// What to send once a scope has been configured.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    Exception(ExceptionInfo),
    Message(String),
}

/// Error-tracking client the bridge reports into.
///
/// Implementations own transport, sampling and retry; the bridge only
/// configures a scope and says what to capture. Hubs are injected into
/// the handler, there is no process-wide current hub.
pub trait Hub: Send + Sync {
    /// Record a breadcrumb for inclusion in later events.
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

    /// Run `configure` against a freshly isolated [`Scope`] and dispatch the
    /// returned [`Capture`] with that scope applied.
    ///
    /// **Contract**
    /// - The scope passed to `configure` is never visible to any other
    ///   `with_scope` call, concurrent or sequential.
    /// - Scope configuration and the capture form one unit: no other
    ///   scope may be interleaved between them.
    /// - Event processors registered on the scope run at dispatch time,
    ///   which may be deferred.
    fn with_scope(&self, configure: &mut dyn FnMut(&mut Scope) -> Capture);
}
