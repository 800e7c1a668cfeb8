//! Environment variable names used by this crate for convenient
//! configuration of the handler from microservices.
//!
//! These are purely helpers; [`HandlerConfig`] itself stays decoupled from
//! environment access.

use crate::handler::HandlerConfig;
use crate::level::{LevelRank, ParseLevelError};

/// Minimum level reported as an event, e.g. `error` or `400`.
pub const BRIDGE_MIN_LEVEL_ENV: &str = "BRIDGE_MIN_LEVEL";

/// Lowest level kept as a breadcrumb. Unset disables breadcrumbs.
pub const BRIDGE_BREADCRUMB_LEVEL_ENV: &str = "BRIDGE_BREADCRUMB_LEVEL";

/// Whether handled records keep bubbling (`true`/`false`).
pub const BRIDGE_BUBBLE_ENV: &str = "BRIDGE_BUBBLE";

/// Whether exception-bearing records are reported.
pub const BRIDGE_REPORT_EXCEPTIONS_ENV: &str = "BRIDGE_REPORT_EXCEPTIONS";

/// Send the formatted line instead of the raw message.
pub const BRIDGE_USE_FORMATTED_MESSAGE_ENV: &str = "BRIDGE_USE_FORMATTED_MESSAGE";

/// Deployment environment stamped onto events.
pub const BRIDGE_ENVIRONMENT_ENV: &str = "BRIDGE_ENVIRONMENT";

/// Release stamped onto events.
pub const BRIDGE_RELEASE_ENV: &str = "BRIDGE_RELEASE";

/// DSN selecting the hub, see [`crate::backend::parse_dsn`].
pub const BRIDGE_DSN_ENV: &str = "BRIDGE_DSN";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Error type returned when an environment variable holds an unusable value.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{key}: {source}")]
    Level {
        key: &'static str,
        #[source]
        source: ParseLevelError,
    },

    #[error("{key}: expected a boolean, got {value:?}")]
    Bool { key: &'static str, value: String },
}

impl HandlerConfig {
    /// Build a config from `BRIDGE_*` variables, starting from the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HandlerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = HandlerConfig::default();

        if let Some(level) = non_empty(lookup(BRIDGE_MIN_LEVEL_ENV)) {
            config.minimum_level = parse_level(BRIDGE_MIN_LEVEL_ENV, &level)?;
        }
        if let Some(level) = non_empty(lookup(BRIDGE_BREADCRUMB_LEVEL_ENV)) {
            config.breadcrumb_level = Some(parse_level(BRIDGE_BREADCRUMB_LEVEL_ENV, &level)?);
        }
        if let Some(value) = non_empty(lookup(BRIDGE_BUBBLE_ENV)) {
            config.bubble = parse_bool(BRIDGE_BUBBLE_ENV, &value)?;
        }
        if let Some(value) = non_empty(lookup(BRIDGE_REPORT_EXCEPTIONS_ENV)) {
            config.report_exceptions = parse_bool(BRIDGE_REPORT_EXCEPTIONS_ENV, &value)?;
        }
        if let Some(value) = non_empty(lookup(BRIDGE_USE_FORMATTED_MESSAGE_ENV)) {
            config.use_formatted_message = parse_bool(BRIDGE_USE_FORMATTED_MESSAGE_ENV, &value)?;
        }
        config.environment = non_empty(lookup(BRIDGE_ENVIRONMENT_ENV));
        config.release = non_empty(lookup(BRIDGE_RELEASE_ENV));

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_level(key: &'static str, value: &str) -> Result<i32, ConfigError> {
    value
        .parse::<LevelRank>()
        .map(|rank| rank.0)
        .map_err(|source| ConfigError::Level { key, source })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Bool {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = HandlerConfig::from_lookup(lookup(&[
            (BRIDGE_MIN_LEVEL_ENV, "warning"),
            (BRIDGE_BREADCRUMB_LEVEL_ENV, "info"),
            (BRIDGE_BUBBLE_ENV, "false"),
            (BRIDGE_REPORT_EXCEPTIONS_ENV, "no"),
            (BRIDGE_USE_FORMATTED_MESSAGE_ENV, "1"),
            (BRIDGE_ENVIRONMENT_ENV, "production"),
            (BRIDGE_RELEASE_ENV, " "),
        ]))
        .expect("config");

        assert_eq!(config.minimum_level, level::WARNING);
        assert_eq!(config.breadcrumb_level, Some(level::INFO));
        assert!(!config.bubble);
        assert!(!config.report_exceptions);
        assert!(config.use_formatted_message);
        assert_eq!(config.environment.as_deref(), Some("production"));
        assert_eq!(config.release, None);
    }

    #[test]
    fn rejects_bad_values() {
        let err = HandlerConfig::from_lookup(lookup(&[(BRIDGE_MIN_LEVEL_ENV, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::Level { key: BRIDGE_MIN_LEVEL_ENV, .. }));

        let err = HandlerConfig::from_lookup(lookup(&[(BRIDGE_BUBBLE_ENV, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Bool { .. }));
    }
}
