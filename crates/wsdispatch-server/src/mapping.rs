//! Endpoint mappings.
//!
//! A mapping resolves a request to an [`EndpointInvocationChain`]. Returning
//! `Ok(None)` means "no match" and lets the dispatcher try the next mapping;
//! returning `Err` aborts dispatch.
//!
//! [`MappingSupport`] carries what every concrete mapping shares: a default
//! endpoint, fixed interceptors, smart interceptors and SOAP actors/roles.
//! [`KeyedEndpointMapping`] looks endpoints up in a map by a key extracted
//! from the request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use wsdispatch_core::logging::{debug, targets};
use wsdispatch_core::{MessageContext, QName, WsError, WsResult};

use crate::{
    Endpoint, EndpointInterceptor, EndpointInvocationChain, LOWEST_PRECEDENCE, SmartInterceptor,
};

/// Resolves requests to endpoint invocation chains.
pub trait EndpointMapping: Send + Sync {
    /// Returns the chain for this request, or `None` if this mapping has no
    /// endpoint for it.
    fn endpoint(&self, ctx: &MessageContext) -> WsResult<Option<EndpointInvocationChain>>;

    /// Sort key used when mappings are discovered from a registry.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

// ============================================================================
// MappingSupport
// ============================================================================

/// Settings shared by the provided mappings.
#[derive(Clone)]
pub struct MappingSupport {
    default_endpoint: Option<Endpoint>,
    interceptors: Vec<Arc<dyn EndpointInterceptor>>,
    smart_interceptors: Vec<SmartInterceptor>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: bool,
    order: i32,
}

impl Default for MappingSupport {
    fn default() -> Self {
        Self {
            default_endpoint: None,
            interceptors: Vec::new(),
            smart_interceptors: Vec::new(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
            order: LOWEST_PRECEDENCE,
        }
    }
}

impl MappingSupport {
    /// Builds the chain for `endpoint`, falling back to the default endpoint.
    ///
    /// The chain holds the fixed interceptors followed by every smart
    /// interceptor that applies to this request.
    #[must_use]
    pub fn create_chain(
        &self,
        ctx: &MessageContext,
        endpoint: Option<Endpoint>,
    ) -> Option<EndpointInvocationChain> {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => {
                let default = self.default_endpoint.clone()?;
                debug!(target: targets::MAPPING, "Using default endpoint [{}]", default);
                default
            }
        };

        let mut interceptors = self.interceptors.clone();
        interceptors.extend(
            self.smart_interceptors
                .iter()
                .filter(|smart| smart.should_intercept(ctx, &endpoint))
                .map(|smart| Arc::clone(smart.interceptor())),
        );

        Some(
            EndpointInvocationChain::new(endpoint)
                .with_interceptors(interceptors)
                .with_actors_or_roles(self.actors_or_roles.clone())
                .ultimate_receiver(self.ultimate_receiver),
        )
    }

    /// Returns the configured order.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }
}

impl fmt::Debug for MappingSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSupport")
            .field("default_endpoint", &self.default_endpoint)
            .field("interceptors", &self.interceptors.len())
            .field("smart_interceptors", &self.smart_interceptors)
            .field("actors_or_roles", &self.actors_or_roles)
            .field("ultimate_receiver", &self.ultimate_receiver)
            .field("order", &self.order)
            .finish()
    }
}

/// Builder methods shared by mappings embedding a [`MappingSupport`].
macro_rules! mapping_support_builders {
    ($ty:ty) => {
        impl $ty {
            /// Sets the endpoint used when the lookup finds nothing.
            #[must_use]
            pub fn default_endpoint(mut self, endpoint: Endpoint) -> Self {
                self.support.default_endpoint = Some(endpoint);
                self
            }

            /// Appends an interceptor applied to every mapped endpoint.
            #[must_use]
            pub fn interceptor<I: EndpointInterceptor + 'static>(mut self, interceptor: I) -> Self {
                self.support.interceptors.push(Arc::new(interceptor));
                self
            }

            /// Replaces the interceptors applied to every mapped endpoint.
            #[must_use]
            pub fn interceptors(mut self, interceptors: Vec<Arc<dyn EndpointInterceptor>>) -> Self {
                self.support.interceptors = interceptors;
                self
            }

            /// Appends a smart interceptor.
            #[must_use]
            pub fn smart_interceptor(mut self, interceptor: SmartInterceptor) -> Self {
                self.support.smart_interceptors.push(interceptor);
                self
            }

            /// Sets the SOAP actors or roles of produced chains.
            #[must_use]
            pub fn actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
                self.support.actors_or_roles = actors_or_roles;
                self
            }

            /// Sets whether produced chains act as ultimate receiver.
            #[must_use]
            pub fn ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
                self.support.ultimate_receiver = ultimate_receiver;
                self
            }

            /// Sets the discovery order.
            #[must_use]
            pub fn with_order(mut self, order: i32) -> Self {
                self.support.order = order;
                self
            }

            /// Returns the shared settings.
            #[must_use]
            pub fn support(&self) -> &MappingSupport {
                &self.support
            }
        }
    };
}

// ============================================================================
// Keyed mappings
// ============================================================================

/// Extracts the lookup key of a [`KeyedEndpointMapping`] from a request.
pub trait LookupKeyStrategy: Send + Sync {
    /// Returns the key for this request; `None` means no lookup.
    fn lookup_key(&self, ctx: &MessageContext) -> WsResult<Option<String>>;

    /// Returns whether `key` may be registered.
    fn validate_key(&self, key: &str) -> bool {
        !key.is_empty()
    }
}

/// Keys requests by their payload root element name (`{namespace}local`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadRootKey;

impl LookupKeyStrategy for PayloadRootKey {
    fn lookup_key(&self, ctx: &MessageContext) -> WsResult<Option<String>> {
        Ok(ctx.request().payload_root().map(QName::to_string))
    }

    fn validate_key(&self, key: &str) -> bool {
        key.parse::<QName>().is_ok()
    }
}

/// Keys requests by their SOAPAction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoapActionKey;

impl LookupKeyStrategy for SoapActionKey {
    fn lookup_key(&self, ctx: &MessageContext) -> WsResult<Option<String>> {
        Ok(request_soap_action(ctx).map(str::to_string))
    }
}

/// Strips the quotes transports put around a SOAPAction. Empty actions
/// count as absent.
pub(crate) fn normalize_soap_action(action: &str) -> Option<&str> {
    Some(action.trim_matches('"')).filter(|action| !action.is_empty())
}

/// The request SOAPAction, normalized.
pub(crate) fn request_soap_action(ctx: &MessageContext) -> Option<&str> {
    ctx.request().soap_action().and_then(normalize_soap_action)
}

/// A mapping that looks endpoints up by a key extracted from the request.
pub struct KeyedEndpointMapping<S> {
    strategy: S,
    endpoints: HashMap<String, Endpoint>,
    support: MappingSupport,
}

/// Routes on the payload root element name.
pub type PayloadRootQNameEndpointMapping = KeyedEndpointMapping<PayloadRootKey>;

/// Routes on the SOAPAction.
pub type SoapActionEndpointMapping = KeyedEndpointMapping<SoapActionKey>;

impl<S: Default> Default for KeyedEndpointMapping<S> {
    fn default() -> Self {
        Self::with_strategy(S::default())
    }
}

impl<S> KeyedEndpointMapping<S> {
    /// Creates an empty mapping using the given key strategy.
    #[must_use]
    pub fn with_strategy(strategy: S) -> Self {
        Self {
            strategy,
            endpoints: HashMap::new(),
            support: MappingSupport::default(),
        }
    }

    /// Returns the registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl KeyedEndpointMapping<PayloadRootKey> {
    /// Creates an empty payload root mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyedEndpointMapping<SoapActionKey> {
    /// Creates an empty SOAPAction mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LookupKeyStrategy> KeyedEndpointMapping<S> {
    /// Registers an endpoint under `key`.
    ///
    /// Fails with a configuration error if the key is invalid for this
    /// strategy or already taken.
    pub fn register_endpoint(&mut self, key: impl fmt::Display, endpoint: Endpoint) -> WsResult<()> {
        let key = key.to_string();
        if !self.strategy.validate_key(&key) {
            return Err(WsError::configuration(format!(
                "Invalid key [{key}] for endpoint [{endpoint}]"
            )));
        }
        if let Some(existing) = self.endpoints.get(&key) {
            return Err(WsError::configuration(format!(
                "Cannot map endpoint [{endpoint}] on registration key [{key}]: \
                 there's already endpoint [{existing}] mapped"
            )));
        }
        debug!(target: targets::MAPPING, "Mapped key [{}] onto endpoint [{}]", key, endpoint);
        self.endpoints.insert(key, endpoint);
        Ok(())
    }

    /// Registers an endpoint, returning the mapping for chaining.
    pub fn with_endpoint(mut self, key: impl fmt::Display, endpoint: Endpoint) -> WsResult<Self> {
        self.register_endpoint(key, endpoint)?;
        Ok(self)
    }

    fn lookup(&self, ctx: &MessageContext) -> WsResult<Option<Endpoint>> {
        let Some(key) = self.strategy.lookup_key(ctx)? else {
            return Ok(None);
        };
        debug!(target: targets::MAPPING, "Looking up endpoint for [{}]", key);
        Ok(self.endpoints.get(&key).cloned())
    }
}

mapping_support_builders!(KeyedEndpointMapping<PayloadRootKey>);
mapping_support_builders!(KeyedEndpointMapping<SoapActionKey>);

impl<S: LookupKeyStrategy> EndpointMapping for KeyedEndpointMapping<S> {
    fn endpoint(&self, ctx: &MessageContext) -> WsResult<Option<EndpointInvocationChain>> {
        let endpoint = self.lookup(ctx)?;
        Ok(self.support.create_chain(ctx, endpoint))
    }

    fn order(&self) -> i32 {
        self.support.order()
    }
}

impl<S: fmt::Debug> fmt::Debug for KeyedEndpointMapping<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedEndpointMapping")
            .field("strategy", &self.strategy)
            .field("keys", &self.keys())
            .field("support", &self.support)
            .finish()
    }
}

// ============================================================================
// Closure mapping
// ============================================================================

type LookupFn = dyn Fn(&MessageContext) -> WsResult<Option<Endpoint>> + Send + Sync;

/// A mapping driven by a lookup closure.
pub struct FnEndpointMapping {
    lookup: Box<LookupFn>,
    support: MappingSupport,
}

impl FnEndpointMapping {
    /// Creates a mapping from a lookup closure.
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(&MessageContext) -> WsResult<Option<Endpoint>> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
            support: MappingSupport::default(),
        }
    }
}

mapping_support_builders!(FnEndpointMapping);

impl EndpointMapping for FnEndpointMapping {
    fn endpoint(&self, ctx: &MessageContext) -> WsResult<Option<EndpointInvocationChain>> {
        let endpoint = (self.lookup)(ctx)?;
        Ok(self.support.create_chain(ctx, endpoint))
    }

    fn order(&self) -> i32 {
        self.support.order()
    }
}

impl fmt::Debug for FnEndpointMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEndpointMapping")
            .field("support", &self.support)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wsdispatch_core::{Payload, WsErrorCode};
    use wsdispatch_protocol::{SoapMessage, SoapMessageFactory};

    use super::*;

    struct Tag;
    impl EndpointInterceptor for Tag {}

    fn request(root: Option<QName>, action: Option<&str>) -> MessageContext {
        let mut msg = SoapMessage::default();
        if let Some(root) = root {
            msg = msg.with_payload(Payload::new(root, json!({})));
        }
        msg.soap_action = action.map(str::to_string);
        SoapMessageFactory::default().create_context(msg)
    }

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::custom(name.to_string(), ())
    }

    #[test]
    fn payload_root_lookup() {
        let mapping = PayloadRootQNameEndpointMapping::new()
            .with_endpoint("{urn:orders}Place", endpoint("place"))
            .unwrap()
            .with_endpoint(QName::new("urn:orders", "Cancel"), endpoint("cancel"))
            .unwrap();
        assert_eq!(mapping.keys(), vec!["{urn:orders}Cancel", "{urn:orders}Place"]);

        let ctx = request(Some(QName::new("urn:orders", "Cancel")), None);
        let chain = mapping.endpoint(&ctx).unwrap().unwrap();
        assert_eq!(chain.endpoint().name(), "cancel");
        assert!(chain.interceptors().is_empty());
        assert!(chain.is_ultimate_receiver());

        let ctx = request(Some(QName::new("urn:orders", "Refund")), None);
        assert!(mapping.endpoint(&ctx).unwrap().is_none());

        let ctx = request(None, None);
        assert!(mapping.endpoint(&ctx).unwrap().is_none());
    }

    #[test]
    fn duplicate_and_invalid_keys_are_rejected() {
        let mut mapping = PayloadRootQNameEndpointMapping::new();
        mapping.register_endpoint("{urn:x}A", endpoint("a")).unwrap();

        let err = mapping.register_endpoint("{urn:x}A", endpoint("b")).unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
        assert!(err.message.contains("already endpoint [a]"));

        let err = mapping.register_endpoint("{urn:x", endpoint("c")).unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
        assert!(err.message.starts_with("Invalid key"));

        let mut actions = SoapActionEndpointMapping::new();
        assert!(actions.register_endpoint("", endpoint("d")).is_err());
    }

    #[test]
    fn soap_action_lookup_ignores_empty_and_quotes() {
        let mapping = SoapActionEndpointMapping::new()
            .with_endpoint("urn:place", endpoint("place"))
            .unwrap();

        let ctx = request(None, Some("\"urn:place\""));
        assert_eq!(mapping.endpoint(&ctx).unwrap().unwrap().endpoint().name(), "place");

        let ctx = request(None, Some(""));
        assert!(mapping.endpoint(&ctx).unwrap().is_none());
    }

    #[test]
    fn default_endpoint_and_interceptors() {
        let mapping = PayloadRootQNameEndpointMapping::new()
            .default_endpoint(endpoint("fallback"))
            .interceptor(Tag)
            .smart_interceptor(SmartInterceptor::for_namespace(Tag, "urn:orders"))
            .smart_interceptor(SmartInterceptor::for_namespace(Tag, "urn:billing"))
            .actors_or_roles(vec!["urn:gateway".into()])
            .ultimate_receiver(false)
            .with_order(5);
        assert_eq!(mapping.order(), 5);

        let ctx = request(Some(QName::new("urn:orders", "Unknown")), None);
        let chain = mapping.endpoint(&ctx).unwrap().unwrap();
        assert_eq!(chain.endpoint().name(), "fallback");
        assert_eq!(chain.interceptors().len(), 2);
        assert_eq!(chain.actors_or_roles(), ["urn:gateway".to_string()]);
        assert!(!chain.is_ultimate_receiver());
    }

    #[test]
    fn quoted_soap_action_routes_and_selects_smart_interceptors() {
        let mapping = SoapActionEndpointMapping::new()
            .with_endpoint("urn:place", endpoint("place"))
            .unwrap()
            .smart_interceptor(SmartInterceptor::for_soap_action(Tag, "urn:place"))
            .smart_interceptor(SmartInterceptor::for_soap_action(Tag, "urn:cancel"));

        for action in ["urn:place", "\"urn:place\""] {
            let chain = mapping.endpoint(&request(None, Some(action))).unwrap().unwrap();
            assert_eq!(chain.endpoint().name(), "place");
            assert_eq!(chain.interceptors().len(), 1, "action {action}");
        }
        assert!(mapping.endpoint(&request(None, Some("\"\""))).unwrap().is_none());
    }

    #[test]
    fn fn_mapping_propagates_errors() {
        let mapping = FnEndpointMapping::new(|ctx| match ctx.request().soap_action() {
            Some("boom") => Err(WsError::internal("lookup failed")),
            Some(_) => Ok(Some(Endpoint::custom("any", ()))),
            None => Ok(None),
        });

        assert!(mapping.endpoint(&request(None, None)).unwrap().is_none());
        assert!(mapping.endpoint(&request(None, Some("x"))).unwrap().is_some());
        let err = mapping.endpoint(&request(None, Some("boom"))).unwrap_err();
        assert_eq!(err.code, WsErrorCode::Internal);
        assert_eq!(mapping.order(), LOWEST_PRECEDENCE);
    }
}
