//! SOAP message model for wsdispatch.
//!
//! This crate provides:
//! - [`SoapVersion`]: SOAP 1.1 / 1.2 constants (envelope namespace, content
//!   type, fault code names)
//! - [`SoapMessage`]: an in-memory message implementing
//!   [`WebServiceMessage`](wsdispatch_core::WebServiceMessage) and
//!   [`FaultAwareMessage`](wsdispatch_core::FaultAwareMessage)
//! - [`SoapMessageFactory`]: creates responses and reads requests
//!
//! # Representation
//!
//! Messages are plain serde structures. Their JSON rendering is used for
//! message tracing and for reading requests in tests and tools; no XML
//! envelope serialization is performed here.

#![forbid(unsafe_code)]

mod factory;
mod message;
mod version;

pub use factory::SoapMessageFactory;
pub use message::SoapMessage;
pub use version::SoapVersion;
