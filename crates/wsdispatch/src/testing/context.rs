//! Request context builder for tests.

use serde::Serialize;
use serde_json::Value;
use wsdispatch_core::{HeaderElement, MessageContext, Payload, QName, SoapFault};
use wsdispatch_protocol::{SoapMessage, SoapMessageFactory, SoapVersion};

/// Builds [`MessageContext`]s around a [`SoapMessage`] request.
///
/// # Example
///
/// ```ignore
/// let mut ctx = TestContext::soap12()
///     .with_payload("urn:orders", "PlaceOrder", json!({"id": 7}))
///     .with_header(HeaderElement::new(QName::new("urn:sec", "Token")).must_understand(true))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    factory: SoapMessageFactory,
    request: SoapMessage,
    properties: Vec<(String, Value)>,
}

impl TestContext {
    /// Creates a SOAP 1.1 test context with an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::with_version(SoapVersion::Soap11)
    }

    /// Creates a SOAP 1.2 test context with an empty request.
    #[must_use]
    pub fn soap12() -> Self {
        Self::with_version(SoapVersion::Soap12)
    }

    /// Creates a test context for the given SOAP version.
    #[must_use]
    pub fn with_version(version: SoapVersion) -> Self {
        Self {
            factory: SoapMessageFactory::new(version),
            request: SoapMessage::new(version),
            properties: Vec::new(),
        }
    }

    /// Sets the request payload.
    #[must_use]
    pub fn with_payload(self, namespace_uri: &str, local_part: &str, body: Value) -> Self {
        self.payload(Payload::new(QName::new(namespace_uri, local_part), body))
    }

    /// Sets the request payload.
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.request.payload = Some(payload);
        self
    }

    /// Sets the request SOAPAction.
    #[must_use]
    pub fn with_soap_action(mut self, action: impl Into<String>) -> Self {
        self.request.soap_action = Some(action.into());
        self
    }

    /// Appends a request header block.
    #[must_use]
    pub fn with_header(mut self, header: HeaderElement) -> Self {
        self.request.headers.push(header);
        self
    }

    /// Presets a context property.
    ///
    /// Values that fail to serialize are stored as `null`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.properties.push((key.into(), value));
        self
    }

    /// Returns the request built so far.
    #[must_use]
    pub fn request(&self) -> &SoapMessage {
        &self.request
    }

    /// Returns the factory used for responses.
    #[must_use]
    pub fn factory(&self) -> SoapMessageFactory {
        self.factory
    }

    /// Creates the message context.
    #[must_use]
    pub fn build(self) -> MessageContext {
        let mut ctx = self.factory.create_context(self.request);
        for (key, value) in self.properties {
            ctx.set_property(key, value);
        }
        ctx
    }
}

/// Returns the response payload, if a response with a payload exists.
#[must_use]
pub fn response_payload(ctx: &MessageContext) -> Option<Payload> {
    ctx.response_if_present()
        .and_then(|response| response.payload())
        .cloned()
}

/// Returns the response fault, if a fault response exists.
#[must_use]
pub fn response_fault(ctx: &MessageContext) -> Option<SoapFault> {
    ctx.response_if_present()
        .and_then(|response| response.as_fault_aware())
        .and_then(|response| response.fault())
        .cloned()
}
