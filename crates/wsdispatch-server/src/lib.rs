//! SOAP message dispatching for wsdispatch.
//!
//! This crate provides the dispatch pipeline:
//! - Endpoint mappings that resolve a request to an invocation chain
//! - Endpoint adapters that know how to invoke an endpoint
//! - Interceptors run around the endpoint, with mustUnderstand checks
//! - Exception resolvers that turn endpoint errors into faults
//!
//! # Example
//!
//! ```ignore
//! use wsdispatch_server::{Endpoint, MessageDispatcher, PayloadRootQNameEndpointMapping};
//!
//! let mapping = PayloadRootQNameEndpointMapping::new()
//!     .with_endpoint("{urn:echo}Echo", Endpoint::payload_fn("echo", |p| Ok(p.cloned())))?;
//!
//! let dispatcher = MessageDispatcher::builder().mapping(mapping).build();
//! dispatcher.receive(&mut ctx)?;
//! ```

#![forbid(unsafe_code)]

mod adapter;
mod builder;
mod chain;
mod config;
mod dispatcher;
mod endpoint;
mod interceptor;
mod mapping;
mod must_understand;
mod observer;
mod registry;
mod resolver;


pub use adapter::{
    EndpointAdapter, FnEndpointAdapter, MessageEndpointAdapter, PayloadEndpointAdapter,
};
pub use builder::MessageDispatcherBuilder;
pub use chain::EndpointInvocationChain;
pub use config::{AfterCompletionPolicy, DispatcherConfig, LoggingSettings};
pub use dispatcher::{FaultClassifier, MessageDispatcher};
pub use endpoint::{Endpoint, EndpointKind, MessageEndpoint, PayloadEndpoint};
pub use interceptor::{
    EndpointInterceptor, InterceptPredicate, PayloadLoggingInterceptor, SmartInterceptor,
};
pub use mapping::{
    EndpointMapping, FnEndpointMapping, KeyedEndpointMapping, LookupKeyStrategy, MappingSupport,
    PayloadRootKey, PayloadRootQNameEndpointMapping, SoapActionEndpointMapping, SoapActionKey,
};
pub use must_understand::{
    DEFAULT_MUST_UNDERSTAND_FAULT_STRING, MustUnderstandConfig, not_understood_headers,
};
pub use observer::{
    DispatchObserver, MessageTracingObserver, NoopObserver, ReceivedRequest, describe, render,
};
pub use registry::ComponentRegistry;
pub use resolver::{
    CompositeEndpointExceptionResolver, EndpointExceptionResolver, ResolverSupport,
    SimpleSoapExceptionResolver, SoapFaultDefinition, SoapFaultMappingExceptionResolver,
    write_fault,
};

use log::Level;
use wsdispatch_console::PlainLoggerBuilder;

/// Order value of strategies that should be tried last. The default.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Order value of strategies that should be tried first.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Logging configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum log level (default: INFO).
    pub level: Level,
    /// Show timestamps in logs (default: true).
    pub timestamps: bool,
    /// Show module targets in logs (default: true).
    pub targets: bool,
    /// Show file:line in logs (default: false).
    pub file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            timestamps: true,
            targets: true,
            file_line: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from environment variables.
    ///
    /// Respects:
    /// - `WSDISPATCH_LOG`: Log level (error, warn, info, debug, trace)
    /// - `WSDISPATCH_LOG_TIMESTAMPS`: Show timestamps (0/false to disable)
    /// - `WSDISPATCH_LOG_TARGETS`: Show targets (0/false to disable)
    /// - `WSDISPATCH_LOG_FILE_LINE`: Show file:line (1/true to enable)
    ///
    /// Unrecognized values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    #[must_use]
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let level = lookup("WSDISPATCH_LOG")
            .and_then(|s| match s.trim().to_lowercase().as_str() {
                "error" => Some(Level::Error),
                "warn" | "warning" => Some(Level::Warn),
                "info" => Some(Level::Info),
                "debug" => Some(Level::Debug),
                "trace" => Some(Level::Trace),
                _ => None,
            })
            .unwrap_or(Level::Info);

        let timestamps = lookup("WSDISPATCH_LOG_TIMESTAMPS")
            .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let targets = lookup("WSDISPATCH_LOG_TARGETS")
            .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let file_line = lookup("WSDISPATCH_LOG_FILE_LINE")
            .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            level,
            timestamps,
            targets,
            file_line,
        }
    }

    /// Installs the plain stderr logger with these settings.
    ///
    /// If another logger is already installed this prints a note to stderr
    /// and leaves it in place.
    pub fn init(&self) {
        let result = PlainLoggerBuilder::new()
            .level(self.level)
            .with_timestamps(self.timestamps)
            .with_targets(self.targets)
            .with_file_line(self.file_line)
            .init();

        if let Err(e) = result {
            eprintln!("Note: wsdispatch logging not initialized (logger already set): {e}");
        }
    }
}
