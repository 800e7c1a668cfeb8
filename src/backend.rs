use std::sync::Arc;

use crate::env::{env_or, BRIDGE_DSN_ENV};
use crate::hub::Hub;
use crate::memory_hub::NoopHub;

/// Supported hub kinds that can be selected via DSN or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubKind {
    Noop,
    Sentry,
}

/// High-level hub configuration built from a DSN.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Selected hub implementation.
    pub kind: HubKind,
    /// Raw DSN that was used to construct this config.
    pub dsn: String,
}

impl HubConfig {
    pub fn new(kind: HubKind, dsn: impl Into<String>) -> Self {
        HubConfig { kind, dsn: dsn.into() }
    }
}

/// Parse a DSN string and infer the hub kind from its scheme.
///
/// Examples:
/// - "noop://" (an empty DSN means the same)
/// - "https://public@o0.ingest.sentry.io/0"
///
/// There is no scheme for [`MemoryHub`](crate::memory_hub::MemoryHub): a
/// hub built from a DSN is returned as `Arc<dyn Hub>` and its captures could
/// never be read back. Construct a `MemoryHub` directly instead.
pub fn parse_dsn(dsn: &str) -> Result<HubConfig, DsnError> {
    let dsn = dsn.trim();
    let lower = dsn.to_ascii_lowercase();

    if lower.is_empty() || lower.starts_with("noop://") {
        Ok(HubConfig::new(HubKind::Noop, dsn))
    } else if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(HubConfig::new(HubKind::Sentry, dsn))
    } else {
        Err(DsnError::UnknownScheme)
    }
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,
}

/// Error type returned when building a hub from configuration.
#[derive(thiserror::Error, Debug)]
pub enum HubBuildError {
    #[error("sentry feature is not enabled")]
    SentryFeatureDisabled,

    #[error("invalid sentry DSN: {0}")]
    InvalidSentryDsn(String),

    #[error(transparent)]
    Dsn(#[from] DsnError),
}

/// Create a concrete [`Hub`] from a [`HubConfig`].
///
/// This is the main entry point for applications that want to select
/// a hub using a single DSN string instead of constructing one manually.
pub fn make_hub_from_config(cfg: &HubConfig) -> Result<Arc<dyn Hub>, HubBuildError> {
    match cfg.kind {
        HubKind::Noop => Ok(Arc::new(NoopHub) as Arc<dyn Hub>),
        HubKind::Sentry => {
            #[cfg(feature = "sentry")]
            {
                let hub = crate::sentry_hub::SentryHub::from_dsn(&cfg.dsn)?;
                Ok(Arc::new(hub) as Arc<dyn Hub>)
            }

            #[cfg(not(feature = "sentry"))]
            {
                let _ = cfg;
                Err(HubBuildError::SentryFeatureDisabled)
            }
        }
    }
}

/// Build the hub named by `BRIDGE_DSN`, defaulting to a no-op hub.
pub fn make_hub_from_env() -> Result<Arc<dyn Hub>, HubBuildError> {
    let cfg = parse_dsn(&env_or(BRIDGE_DSN_ENV, ""))?;
    make_hub_from_config(&cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_kind_from_scheme() {
        assert_eq!(parse_dsn("").unwrap().kind, HubKind::Noop);
        assert_eq!(parse_dsn("noop://").unwrap().kind, HubKind::Noop);
        assert_eq!(
            parse_dsn("https://key@o1.ingest.example.com/42").unwrap().kind,
            HubKind::Sentry
        );
        assert!(matches!(parse_dsn("kafka://broker/topic"), Err(DsnError::UnknownScheme)));
    }

    #[test]
    fn memory_scheme_is_rejected() {
        assert!(matches!(parse_dsn("memory://"), Err(DsnError::UnknownScheme)));
        assert!(matches!(parse_dsn("MEMORY://local"), Err(DsnError::UnknownScheme)));
    }

    #[cfg(not(feature = "sentry"))]
    #[test]
    fn sentry_requires_feature() {
        let cfg = parse_dsn("https://key@o1.ingest.example.com/42").unwrap();
        assert!(matches!(
            make_hub_from_config(&cfg),
            Err(HubBuildError::SentryFeatureDisabled)
        ));
    }
}
