//! Plain log output to stderr.
//!
//! Provides a `log` crate compatible logger that uses [`PlainLogFormatter`].
//!
//! # Usage
//!
//! ```ignore
//! use wsdispatch_console::logging::{PlainLogger, PlainLoggerBuilder};
//! use log::Level;
//!
//! // Simple initialization
//! PlainLogger::try_init(Level::Info);
//!
//! // Or use the builder for more control
//! PlainLoggerBuilder::new()
//!     .level(Level::Debug)
//!     .with_timestamps(true)
//!     .with_targets(true)
//!     .try_init();
//! ```

use log::{Level, LevelFilter, Log, Metadata, Record};
use time::OffsetDateTime;
use time::macros::format_description;

use super::{LogEvent, PlainLogFormatter};

/// Plain-text logger that writes to stderr.
#[derive(Debug)]
pub struct PlainLogger {
    formatter: PlainLogFormatter,
    min_level: Level,
    show_timestamps: bool,
}

impl PlainLogger {
    /// Create a new logger with the given minimum level and default layout.
    #[must_use]
    pub fn new(min_level: Level) -> Self {
        PlainLoggerBuilder::new().level(min_level).build()
    }

    /// Create a logger using the builder pattern.
    #[must_use]
    pub fn builder() -> PlainLoggerBuilder {
        PlainLoggerBuilder::new()
    }

    /// Initialize as the global logger.
    ///
    /// Returns an error if a logger has already been set.
    pub fn init(min_level: Level) -> Result<(), log::SetLoggerError> {
        PlainLoggerBuilder::new().level(min_level).init()
    }

    /// Initialize as the global logger, ignoring errors if already set.
    pub fn try_init(min_level: Level) {
        let _ = Self::init(min_level);
    }

    /// Renders a record the way [`Log::log`] would print it.
    #[must_use]
    pub fn render(&self, record: &Record) -> String {
        self.formatter.format_line(&self.record_to_event(record))
    }

    fn record_to_event(&self, record: &Record) -> LogEvent {
        let mut event =
            LogEvent::new(record.level(), record.args().to_string()).with_target(record.target());

        if self.show_timestamps {
            let format = format_description!("[hour]:[minute]:[second]");
            if let Ok(ts) = OffsetDateTime::now_utc().format(&format) {
                event = event.with_timestamp(ts);
            }
        }

        if let Some(file) = record.file() {
            event = event.with_file(file);
        }
        if let Some(line) = record.line() {
            event = event.with_line(line);
        }

        event
    }
}

/// Builder for configuring the plain logger.
#[derive(Debug)]
pub struct PlainLoggerBuilder {
    min_level: Level,
    show_timestamps: bool,
    show_targets: bool,
    show_file_line: bool,
    max_width: Option<usize>,
}

impl Default for PlainLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainLoggerBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Level::Info,
            show_timestamps: true,
            show_targets: true,
            show_file_line: false,
            max_width: None,
        }
    }

    /// Set the minimum log level.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Set the minimum log level from a LevelFilter.
    ///
    /// `LevelFilter::Off` is treated as `Error`; use no logger to silence output.
    #[must_use]
    pub fn level_filter(mut self, filter: LevelFilter) -> Self {
        self.min_level = filter.to_level().unwrap_or(Level::Error);
        self
    }

    /// Set whether to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    /// Set whether to show targets.
    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    /// Set whether to show file:line information.
    #[must_use]
    pub fn with_file_line(mut self, show: bool) -> Self {
        self.show_file_line = show;
        self
    }

    /// Set maximum message width.
    #[must_use]
    pub fn with_max_width(mut self, width: Option<usize>) -> Self {
        self.max_width = width;
        self
    }

    /// Build the logger without installing it.
    #[must_use]
    pub fn build(self) -> PlainLogger {
        let formatter = PlainLogFormatter::new()
            .with_timestamp(self.show_timestamps)
            .with_target(self.show_targets)
            .with_file_line(self.show_file_line)
            .with_max_width(self.max_width);

        PlainLogger {
            formatter,
            min_level: self.min_level,
            show_timestamps: self.show_timestamps,
        }
    }

    /// Build and install as the global logger.
    ///
    /// Returns an error if a logger has already been set.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.min_level;
        log::set_boxed_logger(Box::new(self.build()))?;
        log::set_max_level(level.to_level_filter());
        Ok(())
    }

    /// Build and install, ignoring errors if already set.
    pub fn try_init(self) {
        let _ = self.init();
    }
}

impl Log for PlainLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.min_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{}", self.render(record));
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(level: Level) -> Metadata<'static> {
        Metadata::builder().level(level).target("test").build()
    }

    #[test]
    fn test_logger_enabled() {
        let logger = PlainLogger::new(Level::Info);
        assert!(logger.enabled(&meta(Level::Error)));
        assert!(logger.enabled(&meta(Level::Warn)));
        assert!(logger.enabled(&meta(Level::Info)));
        assert!(!logger.enabled(&meta(Level::Debug)));
        assert!(!logger.enabled(&meta(Level::Trace)));
    }

    #[test]
    fn test_builder_default() {
        let builder = PlainLoggerBuilder::default();
        assert_eq!(builder.min_level, Level::Info);
        assert!(builder.show_timestamps);
        assert!(builder.show_targets);
        assert!(!builder.show_file_line);
        assert_eq!(builder.max_width, None);
    }

    #[test]
    fn test_builder_level_filter() {
        assert_eq!(
            PlainLoggerBuilder::new().level_filter(LevelFilter::Warn).min_level,
            Level::Warn
        );
        assert_eq!(
            PlainLoggerBuilder::new().level_filter(LevelFilter::Off).min_level,
            Level::Error
        );
    }

    #[test]
    fn test_render_without_timestamps() {
        let logger = PlainLogger::builder()
            .level(Level::Debug)
            .with_timestamps(false)
            .build();
        assert!(!logger.show_timestamps);

        let line = logger.render(
            &Record::builder()
                .level(Level::Debug)
                .target("wsdispatch::mapping")
                .args(format_args!("Looking up [{}]", "{urn:t}Echo"))
                .build(),
        );
        assert_eq!(line, "DEBUG wsdispatch::mapping: Looking up [{urn:t}Echo]");
    }

    #[test]
    fn test_render_with_timestamp() {
        let logger = PlainLogger::builder().with_targets(false).build();
        let line = logger.render(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("ready"))
                .build(),
        );
        // HH:MM:SS prefix
        assert_eq!(line.len(), "00:00:00 INFO  ready".len());
        assert!(line.ends_with("INFO  ready"));
    }
}
