//! Log event model and line formatter.

use log::Level;

/// A single log event, detached from `log::Record` lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity.
    pub level: Level,
    /// Rendered message.
    pub message: String,
    /// Log target, e.g. `wsdispatch::dispatcher`.
    pub target: Option<String>,
    /// Preformatted timestamp.
    pub timestamp: Option<String>,
    /// Source file.
    pub file: Option<String>,
    /// Source line.
    pub line: Option<u32>,
}

impl LogEvent {
    /// Creates an event with the given level and message.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            target: None,
            timestamp: None,
            file: None,
            line: None,
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets the source line.
    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// Formats [`LogEvent`]s as `[time] LEVEL target: message (file:line)`.
#[derive(Debug, Clone, Default)]
pub struct PlainLogFormatter {
    show_timestamp: bool,
    show_target: bool,
    show_file_line: bool,
    max_width: Option<usize>,
}

impl PlainLogFormatter {
    /// Creates a formatter that prints only level and message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to print the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    /// Sets whether to print the target.
    #[must_use]
    pub fn with_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    /// Sets whether to print file:line.
    #[must_use]
    pub fn with_file_line(mut self, show: bool) -> Self {
        self.show_file_line = show;
        self
    }

    /// Truncates messages longer than `width` characters.
    #[must_use]
    pub fn with_max_width(mut self, width: Option<usize>) -> Self {
        self.max_width = width;
        self
    }

    /// Renders one line, without trailing newline.
    #[must_use]
    pub fn format_line(&self, event: &LogEvent) -> String {
        let mut line = String::new();

        if self.show_timestamp {
            if let Some(ts) = &event.timestamp {
                line.push_str(ts);
                line.push(' ');
            }
        }

        line.push_str(&format!("{:<5}", event.level));

        if self.show_target {
            if let Some(target) = &event.target {
                line.push(' ');
                line.push_str(target);
                line.push(':');
            }
        }

        line.push(' ');
        line.push_str(&truncate(&event.message, self.max_width));

        if self.show_file_line {
            match (&event.file, event.line) {
                (Some(file), Some(no)) => line.push_str(&format!(" ({file}:{no})")),
                (Some(file), None) => line.push_str(&format!(" ({file})")),
                _ => {}
            }
        }

        line
    }
}

fn truncate(message: &str, max_width: Option<usize>) -> String {
    match max_width {
        Some(width) if message.chars().count() > width => {
            let mut out: String = message.chars().take(width.saturating_sub(3)).collect();
            out.push_str("...");
            out
        }
        _ => message.to_string(),
    }
}
