use std::sync::Arc;

use tracing::{error, info};
use tracing_error_bridge::handler::{ErrorTrackingHandler, HandlerConfig};
use tracing_error_bridge::hub::{Capture, Hub};
use tracing_error_bridge::init::init_tracing;
use tracing_error_bridge::level;
use tracing_error_bridge::scope::{Breadcrumb, Event, Scope};

/// Example of plugging in a completely custom error tracker by
/// implementing the `Hub` trait directly. Here it just prints what would
/// be sent.
struct PrintingHub;

impl Hub for PrintingHub {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        println!("[breadcrumb] {} {}", breadcrumb.category, breadcrumb.message);
    }

    fn with_scope(&self, configure: &mut dyn FnMut(&mut Scope) -> Capture) {
        let mut scope = Scope::default();
        let capture = configure(&mut scope);

        let mut event = Event::default();
        scope.apply_to_event(&mut event);
        println!("[event] {:?} {:?} tags={:?} extras={:?}", event.level, capture, scope.tags, scope.extras);
    }
}

fn main() {
    let config = HandlerConfig {
        minimum_level: level::ERROR,
        breadcrumb_level: Some(level::INFO),
        release: Some(env!("CARGO_PKG_VERSION").to_string()),
        ..HandlerConfig::default()
    };
    let handler = Arc::new(ErrorTrackingHandler::new(Arc::new(PrintingHub), config));
    if let Err(e) = init_tracing(handler) {
        eprintln!("failed to install subscriber: {}", e);
        return;
    }

    info!("custom hub example started");
    error!(db = "orders", "simulated error sent via custom hub");
}
