use crate::handler::ErrorTrackingHandler;
use crate::layer::{BridgeLayer, Delivery};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Layer configuration.
///
/// Controls how records reach the handler, the size of the internal
/// buffer and batches in buffered mode, and whether events are also
/// printed to the console through a `fmt` layer.
///
/// **Fields**
/// - `buffered`: when `true`, records are queued and handed over as
///   batches; only the highest-level record of each batch is reported.
/// - `channel_buffer`: maximum number of queued records before new ones
///   are dropped.
/// - `batch_size`: number of records per batch.
/// - `flush_interval`: maximum time between flushes even for a partial
///   batch.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`BridgeLayer`].
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub buffered: bool,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            buffered: false,
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
        }
    }
}

impl LayerConfig {
    pub fn delivery(&self) -> Delivery {
        if self.buffered {
            Delivery::Buffered {
                buffer: self.channel_buffer,
                batch_size: self.batch_size,
                flush_interval: self.flush_interval,
            }
        } else {
            Delivery::Immediate
        }
    }
}

/// Initialize the global `tracing` subscriber with a [`BridgeLayer`] in
/// front of `handler`.
///
/// **Returns**
/// - The background flush task in buffered mode, `None` otherwise.
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(
    handler: Arc<ErrorTrackingHandler>,
    config: LayerConfig,
) -> Result<Option<JoinHandle<()>>, SetGlobalDefaultError> {
    let (layer, handle) = BridgeLayer::new(handler, config.delivery());

    // The `fmt` layer changes the subscriber type, so both variants are
    // built separately.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(handle)
}

/// Initialize tracing with [`LayerConfig::default`]: immediate delivery
/// plus console output.
pub fn init_tracing(handler: Arc<ErrorTrackingHandler>) -> Result<Option<JoinHandle<()>>, SetGlobalDefaultError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
