use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use tracing_error_bridge::handler::{ErrorTrackingHandler, HandlerConfig};
use tracing_error_bridge::init::{init_tracing_with_config, LayerConfig};
use tracing_error_bridge::memory_hub::NoopHub;

fn main() {
    let handler = Arc::new(ErrorTrackingHandler::new(Arc::new(NoopHub), HandlerConfig::default()));
    let layer_config = LayerConfig {
        enable_stdout: false,
        ..LayerConfig::default()
    };
    if let Err(e) = init_tracing_with_config(handler, layer_config) {
        eprintln!("failed to install subscriber: {}", e);
        return;
    }

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, tags.load = "default", "default load test error");
    }

    let elapsed = start.elapsed();
    println!("immediate delivery: handled {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
