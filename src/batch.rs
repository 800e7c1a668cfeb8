use crate::formatter::{BatchFormatter, LineFormatter};
use crate::record::LogRecord;
use serde_json::Value;

/// Context key under which the rendered batch is attached.
pub const LOGS_KEY: &str = "logs";

/// Outcome of reducing a batch to one reportable record.
#[derive(Debug, Clone)]
pub struct Reduced {
    /// Highest-level record, with the batch blob under `context.logs`.
    pub representative: LogRecord,
    /// Every record of the batch rendered and joined, in original order.
    pub logs: String,
}

/// Reduce an already-filtered batch to a single representative record.
///
/// The scan keeps the first record seen and only replaces it with a later
/// record of strictly greater level, so ties resolve to the earliest one.
/// All records, the representative included, are rendered through `line`
/// and joined with `batch`; the blob is attached even for a batch of one.
///
/// Returns `None` for an empty batch.
pub fn reduce(
    records: Vec<LogRecord>,
    line: &dyn LineFormatter,
    batch: &dyn BatchFormatter,
) -> Option<Reduced> {
    let mut best: Option<usize> = None;
    for (idx, record) in records.iter().enumerate() {
        let replace = match best {
            Some(current) => record.level > records[current].level,
            None => true,
        };
        if replace {
            best = Some(idx);
        }
    }
    let best = best?;

    let lines: Vec<String> = records.iter().map(|record| line.format(record)).collect();
    let logs = batch.format_batch(&lines);

    let mut representative = records.into_iter().nth(best)?;
    representative
        .context
        .insert(LOGS_KEY.to_string(), Value::String(logs.clone()));

    Some(Reduced { representative, logs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{ConcatBatchFormatter, DefaultLineFormatter};
    use crate::level;

    /// Renders just the message so assertions stay readable.
    struct MessageLine;

    impl LineFormatter for MessageLine {
        fn format(&self, record: &LogRecord) -> String {
            format!("{}\n", record.message)
        }
    }

    #[test]
    fn picks_highest_level_and_renders_all() {
        let records = vec![
            LogRecord::new(level::INFO, "app", "first"),
            LogRecord::new(level::ERROR, "app", "second"),
            LogRecord::new(level::WARNING, "app", "third"),
        ];

        let reduced = reduce(records, &MessageLine, &ConcatBatchFormatter).expect("non-empty");
        assert_eq!(reduced.representative.message, "second");
        assert_eq!(reduced.logs, "first\nsecond\nthird\n");
        assert_eq!(
            reduced.representative.context.get(LOGS_KEY),
            Some(&Value::String("first\nsecond\nthird\n".into()))
        );
    }

    #[test]
    fn ties_keep_the_earliest_record() {
        let records = vec![
            LogRecord::new(level::WARNING, "app", "a"),
            LogRecord::new(level::CRITICAL, "app", "b"),
            LogRecord::new(level::CRITICAL, "app", "c"),
        ];

        let reduced = reduce(records, &MessageLine, &ConcatBatchFormatter).expect("non-empty");
        assert_eq!(reduced.representative.message, "b");
    }

    #[test]
    fn single_record_gets_its_own_line() {
        let record = LogRecord::new(level::ERROR, "app", "only");
        let expected = DefaultLineFormatter.format(&record);

        let reduced = reduce(vec![record], &DefaultLineFormatter, &ConcatBatchFormatter)
            .expect("non-empty");
        assert_eq!(reduced.logs, expected);
        assert_eq!(
            reduced.representative.context.get(LOGS_KEY),
            Some(&Value::String(expected))
        );
    }

    #[test]
    fn empty_batch_has_no_representative() {
        assert!(reduce(Vec::new(), &MessageLine, &ConcatBatchFormatter).is_none());
    }
}
