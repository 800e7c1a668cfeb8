use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_error_bridge::handler::{ErrorTrackingHandler, HandlerConfig};
use tracing_error_bridge::init::{init_tracing_with_config, LayerConfig};
use tracing_error_bridge::memory_hub::NoopHub;

#[tokio::main]
async fn main() {
    let handler = Arc::new(ErrorTrackingHandler::new(Arc::new(NoopHub), HandlerConfig::default()));

    let layer_config = LayerConfig {
        buffered: true,
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
    };

    if let Err(e) = init_tracing_with_config(handler, layer_config) {
        eprintln!("failed to install subscriber: {}", e);
        return;
    }

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("buffered delivery: enqueued {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
}
