//! Plain log formatting module.
//!
//! - [`PlainLogFormatter`] - Renders log events as single text lines
//! - [`PlainLogger`] - A `log` crate logger writing those lines to stderr
//!
//! # Example
//!
//! ```ignore
//! use wsdispatch_console::logging::{LogEvent, PlainLogFormatter};
//!
//! let formatter = PlainLogFormatter::new().with_target(true);
//! let event = LogEvent::new(log::Level::Info, "Dispatcher ready")
//!     .with_target("wsdispatch::dispatcher");
//!
//! eprintln!("{}", formatter.format_line(&event));
//! ```

mod formatter;
mod logger;

pub use formatter::{LogEvent, PlainLogFormatter};
pub use logger::{PlainLogger, PlainLoggerBuilder};
