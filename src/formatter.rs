use crate::level::level_name;
use crate::record::LogRecord;
use serde_json::{Map, Value};

/// Renders one record as one line of text.
pub trait LineFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// Joins already-formatted lines into the batch `logs` blob.
pub trait BatchFormatter: Send + Sync {
    fn format_batch(&self, lines: &[String]) -> String;
}

/// `[datetime] channel.LEVEL: message context extra` followed by a newline.
///
/// Empty `context`/`extra` render as `[]`, a missing datetime as `-`.
#[derive(Debug, Clone, Default)]
pub struct DefaultLineFormatter;

impl LineFormatter for DefaultLineFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let datetime = record
            .datetime
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "[{}] {}.{}: {} {} {}\n",
            datetime,
            record.channel,
            level_name(record.level),
            record.message,
            render_map(&record.context),
            render_map(&record.extra),
        )
    }
}

fn render_map(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        "[]".to_string()
    } else {
        serde_json::to_string(map).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Concatenates lines in order; lines carry their own terminators.
#[derive(Debug, Clone, Default)]
pub struct ConcatBatchFormatter;

impl BatchFormatter for ConcatBatchFormatter {
    fn format_batch(&self, lines: &[String]) -> String {
        lines.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn formats_line_with_context() {
        let record = LogRecord::new(level::WARNING, "db", "slow query")
            .with_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single())
            .with_context("ms", json!(1200));

        let line = DefaultLineFormatter.format(&record);
        assert_eq!(
            line,
            "[2024-05-01T12:00:00+00:00] db.WARNING: slow query {\"ms\":1200} []\n"
        );
    }

    #[test]
    fn missing_datetime_renders_dash() {
        let record = LogRecord::new(level::INFO, "app", "hi").with_datetime(None);
        assert_eq!(DefaultLineFormatter.format(&record), "[-] app.INFO: hi [] []\n");
    }

    #[test]
    fn batch_is_plain_concatenation() {
        let lines = vec!["a\n".to_string(), "b\n".to_string()];
        assert_eq!(ConcatBatchFormatter.format_batch(&lines), "a\nb\n");
        assert_eq!(ConcatBatchFormatter.format_batch(&[]), "");
    }
}
