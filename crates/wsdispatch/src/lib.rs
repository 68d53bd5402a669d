//! wsdispatch: contract-first SOAP message dispatching.
//!
//! A request message is routed to an endpoint through endpoint mappings,
//! wrapped by interceptors, invoked through an endpoint adapter, and any
//! endpoint error is turned into a SOAP fault by exception resolvers.
//!
//! # Quick Start
//!
//! ```ignore
//! use wsdispatch::prelude::*;
//!
//! let mapping = PayloadRootQNameEndpointMapping::new()
//!     .with_endpoint("{urn:echo}Echo", Endpoint::payload_fn("echo", |p| Ok(p.cloned())))?
//!     .interceptor(PayloadLoggingInterceptor::new());
//!
//! let dispatcher = MessageDispatcher::builder().mapping(mapping).build();
//!
//! let factory = SoapMessageFactory::default();
//! let mut ctx = factory.create_context(factory.read_message(bytes)?);
//! dispatcher.receive(&mut ctx)?;
//! ```
//!
//! # Crates
//!
//! - [`core`]: errors, logging targets, message contracts, [`MessageContext`]
//! - [`protocol`]: the in-memory [`SoapMessage`] and its factory
//! - [`server`]: mappings, adapters, interceptors, resolvers, the dispatcher
//! - [`console`]: a plain stderr `log` backend
//!
//! [`MessageContext`]: wsdispatch_core::MessageContext
//! [`SoapMessage`]: wsdispatch_protocol::SoapMessage

#![forbid(unsafe_code)]

pub mod testing;

pub use wsdispatch_console as console;
pub use wsdispatch_core as core;
pub use wsdispatch_protocol as protocol;
pub use wsdispatch_server as server;

pub use wsdispatch_core::{
    FaultCode, HeaderElement, MessageContext, MessageFactory, Payload, QName, SoapFault,
    WebServiceMessage, WsError, WsErrorCode, WsResult,
};
pub use wsdispatch_protocol::{SoapMessage, SoapMessageFactory, SoapVersion};
pub use wsdispatch_server::{
    DispatcherConfig, Endpoint, LoggingConfig, MessageDispatcher, MessageDispatcherBuilder,
};

/// Prelude for applications wiring up a dispatcher.
pub mod prelude {
    pub use wsdispatch_core::{
        FaultAwareMessage, FaultCode, HeaderElement, MessageContext, MessageFactory, Payload,
        QName, SoapFault, WebServiceMessage, WsError, WsErrorCode, WsResult,
    };
    pub use wsdispatch_protocol::{SoapMessage, SoapMessageFactory, SoapVersion};
    pub use wsdispatch_server::{
        AfterCompletionPolicy, ComponentRegistry, DispatchObserver, DispatcherConfig, Endpoint,
        EndpointAdapter, EndpointExceptionResolver, EndpointInterceptor,
        EndpointInvocationChain, EndpointMapping, FnEndpointAdapter, FnEndpointMapping,
        InterceptPredicate, LoggingConfig, MessageDispatcher, MessageDispatcherBuilder,
        MessageEndpoint, PayloadEndpoint, PayloadLoggingInterceptor,
        PayloadRootQNameEndpointMapping, ReceivedRequest, SimpleSoapExceptionResolver,
        SmartInterceptor, SoapActionEndpointMapping, SoapFaultDefinition,
        SoapFaultMappingExceptionResolver,
    };
}
