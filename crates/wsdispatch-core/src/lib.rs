//! Core types and traits for wsdispatch.
//!
//! This crate provides the fundamental building blocks shared by every
//! other wsdispatch crate:
//! - [`WsError`] and [`WsResult`] for dispatch and endpoint failures
//! - The message model ([`WebServiceMessage`], [`FaultAwareMessage`],
//!   [`MessageFactory`], [`QName`], [`SoapFault`])
//! - [`MessageContext`], the per-exchange request/response holder
//! - Structured logging targets built on the [`log`] facade
//!
//! # Design Principles
//!
//! - No runtime reflection: capabilities are trait methods with defaults
//! - All shared types are `Send + Sync`
//! - "Not found" is an `Option`, failures are `Err`

#![forbid(unsafe_code)]

mod context;
mod error;
pub mod logging;
mod message;

pub use context::MessageContext;
pub use error::{WsError, WsErrorCode, WsResult};
pub use message::{
    ACTOR_NEXT, FaultAwareMessage, FaultCode, HeaderElement, MessageFactory, Payload, QName,
    ROLE_NEXT, ROLE_NONE, ROLE_ULTIMATE_RECEIVER, SoapFault, WebServiceMessage,
};
