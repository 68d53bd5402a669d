//! Per-exchange message context.
//!
//! [`MessageContext`] holds the request of a single message exchange and,
//! once requested, its response. The response is created lazily through the
//! [`MessageFactory`] the context was built with, so endpoints that never
//! touch it produce no response at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{MessageFactory, WebServiceMessage};

/// Request/response holder for one message exchange.
///
/// A context is created for every incoming message, handed to the
/// dispatcher, and mutated by interceptors and the endpoint. It is used by
/// one thread at a time.
pub struct MessageContext {
    request: Box<dyn WebServiceMessage>,
    response: Option<Box<dyn WebServiceMessage>>,
    factory: Arc<dyn MessageFactory>,
    properties: HashMap<String, serde_json::Value>,
}

impl MessageContext {
    /// Creates a context for the given request.
    pub fn new(
        request: impl WebServiceMessage + 'static,
        factory: Arc<dyn MessageFactory>,
    ) -> Self {
        Self::from_boxed(Box::new(request), factory)
    }

    /// Creates a context from an already boxed request.
    #[must_use]
    pub fn from_boxed(
        request: Box<dyn WebServiceMessage>,
        factory: Arc<dyn MessageFactory>,
    ) -> Self {
        Self {
            request,
            response: None,
            factory,
            properties: HashMap::new(),
        }
    }

    /// Returns the request message.
    #[must_use]
    pub fn request(&self) -> &dyn WebServiceMessage {
        &*self.request
    }

    /// Returns a mutable reference to the request message.
    pub fn request_mut(&mut self) -> &mut dyn WebServiceMessage {
        &mut *self.request
    }

    /// Returns whether a response has been created.
    ///
    /// This is `true` as soon as [`response`](Self::response) was called,
    /// even if nothing was written to it.
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Returns the response, creating it through the factory on first use.
    pub fn response(&mut self) -> &mut dyn WebServiceMessage {
        let factory = &self.factory;
        &mut **self
            .response
            .get_or_insert_with(|| factory.create_message())
    }

    /// Returns the response without creating it.
    #[must_use]
    pub fn response_if_present(&self) -> Option<&dyn WebServiceMessage> {
        self.response.as_deref()
    }

    /// Returns the mutable response without creating it.
    pub fn response_if_present_mut(&mut self) -> Option<&mut dyn WebServiceMessage> {
        match self.response.as_mut() {
            Some(response) => Some(&mut **response),
            None => None,
        }
    }

    /// Returns the message factory.
    #[must_use]
    pub fn factory(&self) -> &Arc<dyn MessageFactory> {
        &self.factory
    }

    /// Consumes the context, returning the response if one was created.
    #[must_use]
    pub fn into_response(self) -> Option<Box<dyn WebServiceMessage>> {
        self.response
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Stores a property.
    ///
    /// Returns `false` if the value could not be serialized.
    pub fn set_property<T: serde::Serialize>(&mut self, key: impl Into<String>, value: T) -> bool {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.properties.insert(key.into(), json);
                true
            }
            Err(_) => false,
        }
    }

    /// Reads a property, deserializing it into `T`.
    ///
    /// Returns `None` if the key is absent or holds a value of another shape.
    #[must_use]
    pub fn property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.properties.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns the raw JSON value of a property.
    #[must_use]
    pub fn property_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Removes a property, returning its previous value.
    pub fn remove_property(&mut self, key: &str) -> Option<serde_json::Value> {
        self.properties.remove(key)
    }

    /// Returns whether a property exists.
    #[must_use]
    pub fn contains_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Returns the names of all properties, sorted.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("properties", &self.properties.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Payload, QName};

    #[derive(Debug, Default)]
    struct Plain {
        payload: Option<Payload>,
    }

    impl WebServiceMessage for Plain {
        fn payload(&self) -> Option<&Payload> {
            self.payload.as_ref()
        }

        fn set_payload(&mut self, payload: Payload) {
            self.payload = Some(payload);
        }

        fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
            write!(out, "{:?}", self.payload)
        }
    }

    struct CountingFactory(AtomicUsize);

    impl MessageFactory for CountingFactory {
        fn create_message(&self) -> Box<dyn WebServiceMessage> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::new(Plain::default())
        }
    }

    fn context() -> (MessageContext, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory(AtomicUsize::new(0)));
        let request = Plain {
            payload: Some(Payload::new(QName::new("urn:t", "Ping"), serde_json::json!({}))),
        };
        (MessageContext::new(request, factory.clone()), factory)
    }

    #[test]
    fn response_is_created_lazily_once() {
        let (mut ctx, factory) = context();
        assert!(!ctx.has_response());
        assert!(ctx.response_if_present().is_none());
        assert_eq!(factory.0.load(Ordering::SeqCst), 0);

        ctx.response()
            .set_payload(Payload::new(QName::local("Pong"), serde_json::Value::Null));
        assert!(ctx.has_response());
        let _ = ctx.response();
        assert_eq!(factory.0.load(Ordering::SeqCst), 1);

        let root = ctx.response_if_present().and_then(|r| r.payload_root()).cloned();
        assert_eq!(root, Some(QName::local("Pong")));
    }

    #[test]
    fn empty_response_still_counts() {
        let (mut ctx, _) = context();
        let _ = ctx.response();
        assert!(ctx.has_response());
        assert!(ctx.into_response().is_some());
    }

    #[test]
    fn request_is_fixed() {
        let (ctx, _) = context();
        assert_eq!(
            ctx.request().payload_root(),
            Some(&QName::new("urn:t", "Ping"))
        );
    }

    #[test]
    fn properties_round_trip() {
        let (mut ctx, _) = context();
        assert!(ctx.set_property("user", "alice"));
        assert!(ctx.set_property("attempt", 3_u32));

        assert_eq!(ctx.property::<String>("user").as_deref(), Some("alice"));
        assert_eq!(ctx.property::<u32>("attempt"), Some(3));
        assert_eq!(ctx.property::<u32>("user"), None);
        assert!(ctx.contains_property("user"));
        assert_eq!(ctx.property_names(), vec!["attempt", "user"]);

        assert_eq!(ctx.remove_property("user"), Some(serde_json::json!("alice")));
        assert!(!ctx.contains_property("user"));
        assert!(ctx.property_raw("user").is_none());
    }
}
