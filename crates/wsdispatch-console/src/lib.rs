//! Console logging for wsdispatch.
//!
//! Provides a `log` backend that writes one plain line per record to
//! stderr. Applications that already install another `log` implementation
//! do not need this crate.
//!
//! ```ignore
//! use wsdispatch_console::logging::PlainLogger;
//!
//! PlainLogger::builder()
//!     .level(log::Level::Debug)
//!     .with_targets(true)
//!     .try_init();
//! ```

#![forbid(unsafe_code)]

pub mod logging;

pub use logging::{LogEvent, PlainLogFormatter, PlainLogger, PlainLoggerBuilder};
