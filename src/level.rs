use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Numeric level ranks understood by the bridge, lowest to highest.
///
/// Ranks are plain `i32`s so that hosts can emit custom levels; anything
/// not listed here is still a valid rank and simply maps to
/// [`Severity::Error`].
pub const DEBUG: i32 = 100;
pub const INFO: i32 = 200;
pub const NOTICE: i32 = 250;
pub const WARNING: i32 = 300;
pub const ERROR: i32 = 400;
pub const CRITICAL: i32 = 500;
pub const ALERT: i32 = 550;
pub const EMERGENCY: i32 = 600;

/// Severity in the error-tracking taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Map a level rank onto the error-tracking taxonomy.
    ///
    /// Total over `i32`: unknown ranks fall back to `Error` so that a
    /// custom level is still reported rather than lost.
    pub fn from_level(level: i32) -> Self {
        match level {
            DEBUG => Severity::Debug,
            INFO | NOTICE => Severity::Info,
            WARNING => Severity::Warning,
            CRITICAL | ALERT | EMERGENCY => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case name of a rank, as used by the line formatter.
pub fn level_name(level: i32) -> String {
    match level {
        DEBUG => "DEBUG".to_string(),
        INFO => "INFO".to_string(),
        NOTICE => "NOTICE".to_string(),
        WARNING => "WARNING".to_string(),
        ERROR => "ERROR".to_string(),
        CRITICAL => "CRITICAL".to_string(),
        ALERT => "ALERT".to_string(),
        EMERGENCY => "EMERGENCY".to_string(),
        other => format!("LEVEL{}", other),
    }
}

/// Rank for a `tracing` level. `TRACE` has no counterpart and shares `DEBUG`.
pub fn from_tracing(level: &tracing::Level) -> i32 {
    match *level {
        tracing::Level::ERROR => ERROR,
        tracing::Level::WARN => WARNING,
        tracing::Level::INFO => INFO,
        tracing::Level::DEBUG | tracing::Level::TRACE => DEBUG,
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

/// A level rank parsed from a name (`"warning"`, `"warn"`, `"CRITICAL"`)
/// or a bare integer (`"450"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRank(pub i32);

impl FromStr for LevelRank {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rank) = trimmed.parse::<i32>() {
            return Ok(LevelRank(rank));
        }

        let rank = match trimmed.to_ascii_lowercase().as_str() {
            "trace" | "debug" => DEBUG,
            "info" => INFO,
            "notice" => NOTICE,
            "warn" | "warning" => WARNING,
            "error" => ERROR,
            "critical" => CRITICAL,
            "alert" => ALERT,
            "emergency" => EMERGENCY,
            _ => return Err(ParseLevelError(trimmed.to_string())),
        };
        Ok(LevelRank(rank))
    }
}
