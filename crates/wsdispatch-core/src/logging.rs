//! Structured logging for wsdispatch.
//!
//! This module provides structured logging support built on the standard
//! [`log`] facade. All wsdispatch crates use these logging utilities.
//!
//! # Log Levels
//!
//! - **error**: Unrecoverable failures surfaced to the transport layer
//! - **warn**: Requests with no endpoint, unresolved endpoint errors,
//!   mustUnderstand faults, failing completion callbacks
//! - **info**: Dispatcher lifecycle (configuration, discovery)
//! - **debug**: Mapping, adapter and resolver decisions
//! - **trace**: Full message contents
//!
//! # Usage
//!
//! ```ignore
//! use wsdispatch_core::logging::{debug, targets};
//!
//! debug!(target: targets::MAPPING, "Looking up endpoint for [{}]", key);
//! ```
//!
//! # Initialization
//!
//! wsdispatch-core does not include a log implementation. Applications can
//! install the plain stderr logger from `wsdispatch-console`, or any other
//! `log` backend.
//!
//! # Log Targets
//!
//! - `wsdispatch`: Root target for all wsdispatch logs
//! - `wsdispatch::dispatcher`: Dispatch lifecycle
//! - `wsdispatch::mapping`: Endpoint mapping lookups
//! - `wsdispatch::adapter`: Endpoint adapter selection and invocation
//! - `wsdispatch::interceptor`: Interceptor callbacks
//! - `wsdispatch::resolver`: Exception resolution
//! - `wsdispatch::endpoint_not_found`: Requests no mapping could route
//! - `wsdispatch::tracing::received` / `wsdispatch::tracing::sent`: Message tracing
//!
//! Example filter: `WSDISPATCH_LOG=debug` or, with `env_logger`-style
//! backends, `RUST_LOG=wsdispatch::tracing=trace`

pub use log::{debug, error, info, trace, warn};

pub use log::{Level, LevelFilter};

/// Log targets used by wsdispatch components.
pub mod targets {
    /// Root target for all wsdispatch logs.
    pub const WSDISPATCH: &str = "wsdispatch";

    /// Dispatch lifecycle.
    pub const DISPATCHER: &str = "wsdispatch::dispatcher";

    /// Endpoint mapping lookups.
    pub const MAPPING: &str = "wsdispatch::mapping";

    /// Endpoint adapter selection and invocation.
    pub const ADAPTER: &str = "wsdispatch::adapter";

    /// Interceptor callbacks.
    pub const INTERCEPTOR: &str = "wsdispatch::interceptor";

    /// Endpoint exception resolution.
    pub const RESOLVER: &str = "wsdispatch::resolver";

    /// Requests for which no endpoint mapping matched.
    pub const ENDPOINT_NOT_FOUND: &str = "wsdispatch::endpoint_not_found";

    /// Root of the message tracing targets.
    pub const TRACING: &str = "wsdispatch::tracing";

    /// Received request messages.
    pub const TRACING_RECEIVED: &str = "wsdispatch::tracing::received";

    /// Sent response messages.
    pub const TRACING_SENT: &str = "wsdispatch::tracing::sent";

    /// Configuration loading.
    pub const CONFIG: &str = "wsdispatch::config";
}

/// Returns whether logging is enabled at the given level for the given target.
///
/// Useful to avoid rendering message contents nobody will see:
///
/// ```ignore
/// if is_enabled(Level::Trace, targets::TRACING_RECEIVED) {
///     let content = render(ctx.request());
///     trace!(target: targets::TRACING_RECEIVED, "Received request [{}]", content);
/// }
/// ```
#[inline]
#[must_use]
pub fn is_enabled(level: Level, target: &str) -> bool {
    log::log_enabled!(target: target, level)
}

/// Logs a dispatch lifecycle event at DEBUG level.
#[macro_export]
macro_rules! log_dispatcher {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "wsdispatch::dispatcher", $($arg)*)
    };
}

/// Logs an endpoint mapping event at DEBUG level.
#[macro_export]
macro_rules! log_mapping {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "wsdispatch::mapping", $($arg)*)
    };
}

/// Logs an endpoint adapter event at DEBUG level.
#[macro_export]
macro_rules! log_adapter {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "wsdispatch::adapter", $($arg)*)
    };
}

/// Logs an exception resolution event at DEBUG level.
#[macro_export]
macro_rules! log_resolver {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "wsdispatch::resolver", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_targets_are_hierarchical() {
        assert!(targets::DISPATCHER.starts_with(targets::WSDISPATCH));
        assert!(targets::MAPPING.starts_with(targets::WSDISPATCH));
        assert!(targets::ADAPTER.starts_with(targets::WSDISPATCH));
        assert!(targets::INTERCEPTOR.starts_with(targets::WSDISPATCH));
        assert!(targets::RESOLVER.starts_with(targets::WSDISPATCH));
        assert!(targets::ENDPOINT_NOT_FOUND.starts_with(targets::WSDISPATCH));
        assert!(targets::TRACING_RECEIVED.starts_with(targets::TRACING));
        assert!(targets::TRACING_SENT.starts_with(targets::TRACING));
        assert!(targets::CONFIG.starts_with(targets::WSDISPATCH));
    }

    #[test]
    fn disabled_without_logger() {
        // No logger is installed in unit tests, so nothing is enabled.
        assert!(!is_enabled(Level::Trace, targets::TRACING_RECEIVED));
    }
}
