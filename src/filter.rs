use crate::record::LogRecord;

/// Keep records at or above `minimum_level`, preserving their order.
///
/// An empty result means the whole batch is discarded; callers treat that
/// as a silent no-op.
pub fn filter(records: Vec<LogRecord>, minimum_level: i32) -> Vec<LogRecord> {
    records
        .into_iter()
        .filter(|record| record.level >= minimum_level)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;

    #[test]
    fn drops_records_below_minimum() {
        let records = vec![
            LogRecord::new(level::DEBUG, "app", "a"),
            LogRecord::new(level::WARNING, "app", "b"),
            LogRecord::new(level::INFO, "app", "c"),
            LogRecord::new(level::ERROR, "app", "d"),
        ];

        let kept: Vec<String> = filter(records, level::WARNING)
            .into_iter()
            .map(|r| r.message)
            .collect();
        assert_eq!(kept, vec!["b", "d"]);
    }

    #[test]
    fn all_below_minimum_is_empty() {
        let records = vec![LogRecord::new(level::INFO, "app", "a")];
        assert!(filter(records, level::ERROR).is_empty());
    }
}
