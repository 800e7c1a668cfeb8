use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use tracing_error_bridge::backend::make_hub_from_env;
use tracing_error_bridge::handler::{ErrorTrackingHandler, HandlerConfig};
use tracing_error_bridge::init::{init_tracing_with_config, LayerConfig};

/// Reads `BRIDGE_*` variables, e.g.
///
/// BRIDGE_DSN=noop:// BRIDGE_MIN_LEVEL=info BRIDGE_ENVIRONMENT=staging
#[tokio::main]
async fn main() {
    let config = match HandlerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return;
        }
    };
    let hub = match make_hub_from_env() {
        Ok(hub) => hub,
        Err(e) => {
            eprintln!("cannot build hub: {}", e);
            return;
        }
    };

    let handler = Arc::new(ErrorTrackingHandler::new(hub, config));
    let layer_config = LayerConfig {
        buffered: true,
        flush_interval: Duration::from_millis(500),
        ..LayerConfig::default()
    };
    if let Err(e) = init_tracing_with_config(handler, layer_config) {
        eprintln!("failed to install subscriber: {}", e);
        return;
    }

    info!(order_id = 17, "checkout started");
    warn!(attempt = 2, "payment provider slow");
    error!(
        tags.provider = "acme",
        user.id = "u-17",
        fingerprint = "payment-timeout",
        "payment timed out"
    );

    sleep(Duration::from_secs(1)).await;
}
