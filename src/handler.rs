use crate::batch;
use crate::filter;
use crate::formatter::{BatchFormatter, ConcatBatchFormatter, DefaultLineFormatter, LineFormatter};
use crate::hub::Hub;
use crate::level::{self, Severity};
use crate::record::LogRecord;
use crate::reporter;
use crate::scope::Breadcrumb;
use std::sync::Arc;

/// Handler settings, fixed at construction apart from
/// [`ErrorTrackingHandler::set_environment`] and
/// [`ErrorTrackingHandler::set_release`].
///
/// **Fields**
/// - `minimum_level`: records below this rank are ignored.
/// - `bubble`: whether a handled record should keep propagating to other
///   handlers of the host.
/// - `report_exceptions`: when off, exception-bearing records are dropped.
/// - `use_formatted_message`: send the formatted line instead of the raw
///   message.
/// - `environment` / `release`: stamped onto events that have none.
/// - `breadcrumb_level`: records from this rank up to `minimum_level`
///   (exclusive) are recorded as breadcrumbs instead of being dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
    pub minimum_level: i32,
    pub bubble: bool,
    pub report_exceptions: bool,
    pub use_formatted_message: bool,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub breadcrumb_level: Option<i32>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            minimum_level: level::DEBUG,
            bubble: true,
            report_exceptions: true,
            use_formatted_message: false,
            environment: None,
            release: None,
            breadcrumb_level: None,
        }
    }
}

/// Entry point the host logging subsystem calls with records.
///
/// Records go through filter → batch reduction → scope building →
/// reporting. Nothing here performs I/O or spawns work; all of that is up
/// to the injected [`Hub`].
pub struct ErrorTrackingHandler {
    hub: Arc<dyn Hub>,
    config: HandlerConfig,
    line_formatter: Box<dyn LineFormatter>,
    batch_formatter: Box<dyn BatchFormatter>,
}

impl ErrorTrackingHandler {
    pub fn new(hub: Arc<dyn Hub>, config: HandlerConfig) -> Self {
        Self {
            hub,
            config,
            line_formatter: Box::new(DefaultLineFormatter),
            batch_formatter: Box::new(ConcatBatchFormatter),
        }
    }

    pub fn with_line_formatter(mut self, formatter: impl LineFormatter + 'static) -> Self {
        self.line_formatter = Box::new(formatter);
        self
    }

    pub fn with_batch_formatter(mut self, formatter: impl BatchFormatter + 'static) -> Self {
        self.batch_formatter = Box::new(formatter);
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<dyn Hub> {
        &self.hub
    }

    pub fn set_environment(&mut self, environment: Option<String>) {
        self.config.environment = environment;
    }

    pub fn set_release(&mut self, release: Option<String>) {
        self.config.release = release;
    }

    pub fn is_handling(&self, record: &LogRecord) -> bool {
        record.level >= self.config.minimum_level
    }

    /// Handle a single record.
    ///
    /// **Returns**
    /// - `true` if the record was handled and must not bubble further.
    /// - `false` if it was ignored, or handled with `bubble` enabled.
    pub fn handle(&self, mut record: LogRecord) -> bool {
        if !self.is_handling(&record) {
            self.record_breadcrumb(&record);
            return false;
        }

        if record.formatted_message.is_empty() {
            record.formatted_message = self.line_formatter.format(&record);
        }
        self.write(&record);

        !self.config.bubble
    }

    /// Handle a batch flushed by the host.
    ///
    /// Only the highest-level record is reported; the whole filtered batch
    /// is attached to it as the `logs` context entry. A batch with nothing
    /// at or above `minimum_level` makes no hub call at all.
    pub fn handle_batch(&self, records: Vec<LogRecord>) {
        for record in records.iter().filter(|r| !self.is_handling(r)) {
            self.record_breadcrumb(record);
        }

        let records = filter::filter(records, self.config.minimum_level);
        if records.is_empty() {
            return;
        }

        if let Some(reduced) = batch::reduce(
            records,
            self.line_formatter.as_ref(),
            self.batch_formatter.as_ref(),
        ) {
            self.handle(reduced.representative);
        }
    }

    /// Report `record` unconditionally.
    pub fn write(&self, record: &LogRecord) {
        reporter::report(record, &self.config, self.hub.as_ref());
    }

    /// Forward a below-threshold record as a breadcrumb when it reaches
    /// `breadcrumb_level`. Returns whether a breadcrumb was recorded.
    pub fn record_breadcrumb(&self, record: &LogRecord) -> bool {
        let Some(breadcrumb_level) = self.config.breadcrumb_level else {
            return false;
        };
        if record.level < breadcrumb_level || self.is_handling(record) {
            return false;
        }

        self.hub.add_breadcrumb(Breadcrumb {
            timestamp: record.datetime,
            category: record.channel.clone(),
            level: Severity::from_level(record.level),
            message: record.message.clone(),
            data: record.context.clone(),
        });
        true
    }
}
