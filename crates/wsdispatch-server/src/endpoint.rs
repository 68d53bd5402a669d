//! Endpoint handles.
//!
//! An [`Endpoint`] is what a mapping resolves a request to. The dispatcher
//! treats it as opaque; adapters inspect its [`EndpointKind`] to decide
//! whether they can invoke it.
//!
//! - **Message endpoints** receive the whole [`MessageContext`]
//! - **Payload endpoints** map a request payload to an optional response payload
//! - **Custom endpoints** wrap an arbitrary object understood only by a
//!   matching custom adapter

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use wsdispatch_core::{MessageContext, Payload, WsResult};

/// An endpoint that handles the full message context.
pub trait MessageEndpoint: Send + Sync {
    /// Handles the request, writing the response through `ctx` if any.
    fn invoke(&self, ctx: &mut MessageContext) -> WsResult<()>;
}

/// An endpoint that handles only the request payload.
pub trait PayloadEndpoint: Send + Sync {
    /// Handles the request payload and returns the response payload, if any.
    fn invoke(&self, request: Option<&Payload>) -> WsResult<Option<Payload>>;
}

struct FnMessageEndpoint<F>(F);

impl<F> MessageEndpoint for FnMessageEndpoint<F>
where
    F: Fn(&mut MessageContext) -> WsResult<()> + Send + Sync,
{
    fn invoke(&self, ctx: &mut MessageContext) -> WsResult<()> {
        (self.0)(ctx)
    }
}

struct FnPayloadEndpoint<F>(F);

impl<F> PayloadEndpoint for FnPayloadEndpoint<F>
where
    F: Fn(Option<&Payload>) -> WsResult<Option<Payload>> + Send + Sync,
{
    fn invoke(&self, request: Option<&Payload>) -> WsResult<Option<Payload>> {
        (self.0)(request)
    }
}

/// The shape of an endpoint, used by adapters for capability probing.
#[derive(Clone)]
pub enum EndpointKind {
    /// Handles the whole message context.
    Message(Arc<dyn MessageEndpoint>),
    /// Handles request payloads.
    Payload(Arc<dyn PayloadEndpoint>),
    /// Application-defined object.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(_) => f.write_str("Message"),
            Self::Payload(_) => f.write_str("Payload"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A named, cheaply cloneable endpoint handle.
#[derive(Clone)]
pub struct Endpoint {
    name: Arc<str>,
    kind: EndpointKind,
}

impl Endpoint {
    /// Creates an endpoint from its name and kind.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, kind: EndpointKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Creates a message endpoint.
    #[must_use]
    pub fn message<E: MessageEndpoint + 'static>(name: impl Into<Arc<str>>, endpoint: E) -> Self {
        Self::new(name, EndpointKind::Message(Arc::new(endpoint)))
    }

    /// Creates a message endpoint from a closure.
    #[must_use]
    pub fn message_fn<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut MessageContext) -> WsResult<()> + Send + Sync + 'static,
    {
        Self::message(name, FnMessageEndpoint(f))
    }

    /// Creates a payload endpoint.
    #[must_use]
    pub fn payload<E: PayloadEndpoint + 'static>(name: impl Into<Arc<str>>, endpoint: E) -> Self {
        Self::new(name, EndpointKind::Payload(Arc::new(endpoint)))
    }

    /// Creates a payload endpoint from a closure.
    #[must_use]
    pub fn payload_fn<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Option<&Payload>) -> WsResult<Option<Payload>> + Send + Sync + 'static,
    {
        Self::payload(name, FnPayloadEndpoint(f))
    }

    /// Wraps an application object that only a custom adapter can invoke.
    #[must_use]
    pub fn custom<T: Any + Send + Sync>(name: impl Into<Arc<str>>, object: T) -> Self {
        Self::new(name, EndpointKind::Custom(Arc::new(object)))
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the endpoint kind.
    #[must_use]
    pub fn kind(&self) -> &EndpointKind {
        &self.kind
    }

    /// Returns the message endpoint, if this is one.
    #[must_use]
    pub fn as_message(&self) -> Option<&Arc<dyn MessageEndpoint>> {
        match &self.kind {
            EndpointKind::Message(endpoint) => Some(endpoint),
            _ => None,
        }
    }

    /// Returns the payload endpoint, if this is one.
    #[must_use]
    pub fn as_payload(&self) -> Option<&Arc<dyn PayloadEndpoint>> {
        match &self.kind {
            EndpointKind::Payload(endpoint) => Some(endpoint),
            _ => None,
        }
    }

    /// Returns the custom object, if this is a custom endpoint of type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.kind {
            EndpointKind::Custom(object) => object.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Legacy {
        greeting: &'static str,
    }

    #[test]
    fn kinds_are_probed() {
        let message = Endpoint::message_fn("m", |_ctx: &mut MessageContext| Ok(()));
        assert!(message.as_message().is_some());
        assert!(message.as_payload().is_none());

        let payload = Endpoint::payload_fn("p", |req: Option<&Payload>| Ok(req.cloned()));
        assert!(payload.as_payload().is_some());
        assert!(payload.downcast_ref::<Legacy>().is_none());

        let custom = Endpoint::custom("c", Legacy { greeting: "hi" });
        assert_eq!(custom.downcast_ref::<Legacy>().map(|l| l.greeting), Some("hi"));
        assert!(custom.downcast_ref::<String>().is_none());
        assert!(custom.as_message().is_none());
    }

    #[test]
    fn name_and_display() {
        let endpoint = Endpoint::custom("orders", ());
        assert_eq!(endpoint.name(), "orders");
        assert_eq!(endpoint.to_string(), "orders");
        assert_eq!(format!("{endpoint:?}"), "Endpoint { name: \"orders\", kind: Custom }");
    }
}
