//! Endpoint exception resolvers.
//!
//! When an endpoint fails, the dispatcher offers the error to each resolver
//! in turn. A resolver that claims the error returns `true` after writing a
//! fault into the response; if none does, the error reaches the caller.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use wsdispatch_core::logging::{debug, targets, warn};
use wsdispatch_core::{FaultCode, MessageContext, QName, SoapFault, WsError, WsResult};

use crate::{Endpoint, LOWEST_PRECEDENCE};

/// Turns endpoint errors into responses.
pub trait EndpointExceptionResolver: Send + Sync {
    /// Tries to resolve `error` raised by `endpoint`.
    ///
    /// Returns `true` if the error was handled, typically by writing a fault.
    fn resolve_exception(
        &self,
        ctx: &mut MessageContext,
        endpoint: &Endpoint,
        error: &WsError,
    ) -> bool;

    /// Sort key, lower values first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

/// Writes `fault` into the response.
///
/// Returns `false` if the response cannot carry faults.
pub fn write_fault(ctx: &mut MessageContext, fault: SoapFault) -> bool {
    match ctx.response().as_fault_aware_mut() {
        Some(response) => {
            response.set_fault(fault);
            true
        }
        None => false,
    }
}

// ============================================================================
// Composite
// ============================================================================

/// Tries a list of resolvers, sorted by [`order`](EndpointExceptionResolver::order).
#[derive(Clone)]
pub struct CompositeEndpointExceptionResolver {
    resolvers: Vec<Arc<dyn EndpointExceptionResolver>>,
    order: i32,
}

impl Default for CompositeEndpointExceptionResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CompositeEndpointExceptionResolver {
    /// Creates a composite from `resolvers`, stably sorted by order.
    #[must_use]
    pub fn new(mut resolvers: Vec<Arc<dyn EndpointExceptionResolver>>) -> Self {
        resolvers.sort_by_key(|r| r.order());
        Self {
            resolvers,
            order: LOWEST_PRECEDENCE,
        }
    }

    /// Adds a resolver, keeping the list sorted.
    #[must_use]
    pub fn resolver<R: EndpointExceptionResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self.resolvers.sort_by_key(|r| r.order());
        self
    }

    /// Sets the order of the composite itself.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Returns the resolvers in trial order.
    #[must_use]
    pub fn resolvers(&self) -> &[Arc<dyn EndpointExceptionResolver>] {
        &self.resolvers
    }
}

impl EndpointExceptionResolver for CompositeEndpointExceptionResolver {
    fn resolve_exception(
        &self,
        ctx: &mut MessageContext,
        endpoint: &Endpoint,
        error: &WsError,
    ) -> bool {
        self.resolvers
            .iter()
            .any(|resolver| resolver.resolve_exception(ctx, endpoint, error))
    }

    fn order(&self) -> i32 {
        self.order
    }
}

impl fmt::Debug for CompositeEndpointExceptionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeEndpointExceptionResolver")
            .field("resolvers", &self.resolvers.len())
            .field("order", &self.order)
            .finish()
    }
}

// ============================================================================
// ResolverSupport
// ============================================================================

/// Settings shared by the provided resolvers.
#[derive(Debug, Clone)]
pub struct ResolverSupport {
    mapped_endpoints: Option<HashSet<String>>,
    warn_log_target: Option<String>,
    order: i32,
}

impl Default for ResolverSupport {
    fn default() -> Self {
        Self {
            mapped_endpoints: None,
            warn_log_target: None,
            order: LOWEST_PRECEDENCE,
        }
    }
}

impl ResolverSupport {
    /// Restricts the resolver to the named endpoints.
    #[must_use]
    pub fn mapped_endpoints<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapped_endpoints = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Logs every resolved error at WARN under `target`.
    #[must_use]
    pub fn warn_log_target(mut self, target: impl Into<String>) -> Self {
        self.warn_log_target = Some(target.into());
        self
    }

    /// Sets the order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Returns the order.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns whether the resolver applies to `endpoint`.
    #[must_use]
    pub fn applies_to(&self, endpoint: &Endpoint) -> bool {
        self.mapped_endpoints
            .as_ref()
            .is_none_or(|names| names.contains(endpoint.name()))
    }

    /// Runs `resolve` if the resolver applies, logging the outcome.
    pub fn resolve_with(
        &self,
        endpoint: &Endpoint,
        error: &WsError,
        resolve: impl FnOnce() -> bool,
    ) -> bool {
        if !self.applies_to(endpoint) {
            return false;
        }
        wsdispatch_core::log_resolver!("Resolving error from endpoint [{}]: {}", endpoint, error);
        let resolved = resolve();
        if resolved {
            if let Some(target) = &self.warn_log_target {
                warn!(target: target.as_str(), "Endpoint [{}] failed: {}", endpoint, error);
            }
        }
        resolved
    }
}

// ============================================================================
// SimpleSoapExceptionResolver
// ============================================================================

/// Turns every error into a receiver (server) fault carrying its message.
#[derive(Debug, Clone)]
pub struct SimpleSoapExceptionResolver {
    support: ResolverSupport,
    lang: Option<String>,
}

impl Default for SimpleSoapExceptionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleSoapExceptionResolver {
    /// Creates a resolver producing English fault reasons.
    #[must_use]
    pub fn new() -> Self {
        Self {
            support: ResolverSupport::default(),
            lang: Some("en".to_string()),
        }
    }

    /// Sets the reason language; `None` omits it.
    #[must_use]
    pub fn lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang;
        self
    }

    /// Replaces the shared settings.
    #[must_use]
    pub fn support(mut self, support: ResolverSupport) -> Self {
        self.support = support;
        self
    }
}

impl EndpointExceptionResolver for SimpleSoapExceptionResolver {
    fn resolve_exception(
        &self,
        ctx: &mut MessageContext,
        endpoint: &Endpoint,
        error: &WsError,
    ) -> bool {
        self.support.resolve_with(endpoint, error, || {
            let mut fault = SoapFault::receiver(error.message.clone());
            if let Some(lang) = &self.lang {
                fault = fault.with_lang(lang.clone());
            }
            write_fault(ctx, fault)
        })
    }

    fn order(&self) -> i32 {
        self.support.order()
    }
}

// ============================================================================
// SoapFaultDefinition
// ============================================================================

/// A fault template: code, reason and language.
///
/// Parses from `CODE[,reason[,lang]]`, where `CODE` is one of `SERVER`,
/// `RECEIVER`, `CLIENT`, `SENDER` or a `{namespace}local` name. An empty
/// reason means "use the error message".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFaultDefinition {
    /// Fault code.
    pub code: FaultCode,
    /// Fault reason, empty to use the error message.
    pub reason: String,
    /// Reason language.
    pub lang: Option<String>,
}

impl SoapFaultDefinition {
    /// A receiver fault with the given reason.
    #[must_use]
    pub fn receiver(reason: impl Into<String>) -> Self {
        Self {
            code: FaultCode::Receiver,
            reason: reason.into(),
            lang: None,
        }
    }

    /// A sender fault with the given reason.
    #[must_use]
    pub fn sender(reason: impl Into<String>) -> Self {
        Self {
            code: FaultCode::Sender,
            reason: reason.into(),
            lang: None,
        }
    }

    /// Builds the fault for `error`.
    #[must_use]
    pub fn to_fault(&self, error: &WsError) -> SoapFault {
        let reason = if self.reason.is_empty() {
            error.message.clone()
        } else {
            self.reason.clone()
        };
        let fault = SoapFault::new(self.code.clone(), reason);
        match &self.lang {
            Some(lang) => fault.with_lang(lang.clone()),
            None => fault,
        }
    }
}

impl FromStr for SoapFaultDefinition {
    type Err = WsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(',').map(str::trim).collect();
        if tokens.len() > 3 {
            return Err(WsError::configuration(format!(
                "fault definition [{s}] has more than three parts"
            )));
        }
        let code = match tokens[0] {
            "" => {
                return Err(WsError::configuration(format!(
                    "fault definition [{s}] has no fault code"
                )));
            }
            "SERVER" | "RECEIVER" => FaultCode::Receiver,
            "CLIENT" | "SENDER" => FaultCode::Sender,
            custom => {
                let name: QName = custom.parse().map_err(|err: WsError| {
                    WsError::configuration(format!(
                        "fault definition [{s}] has an invalid fault code: {}",
                        err.message
                    ))
                })?;
                if name.namespace_uri.is_empty() {
                    return Err(WsError::configuration(format!(
                        "fault definition [{s}]: custom fault code [{custom}] needs a namespace"
                    )));
                }
                FaultCode::Custom(name)
            }
        };
        Ok(Self {
            code,
            reason: tokens.get(1).copied().unwrap_or_default().to_string(),
            lang: tokens
                .get(2)
                .filter(|lang| !lang.is_empty())
                .map(|lang| (*lang).to_string()),
        })
    }
}

// ============================================================================
// SoapFaultMappingExceptionResolver
// ============================================================================

/// Maps error classifications to fault definitions.
///
/// A mapping key matches an error whose [`kind`](WsError::kind) equals it
/// (closest) or whose code name equals it. The closest match wins, earlier
/// registrations win ties, and the default fault applies when nothing
/// matches. Without a default, unmatched errors are not resolved.
#[derive(Debug, Clone, Default)]
pub struct SoapFaultMappingExceptionResolver {
    support: ResolverSupport,
    mappings: Vec<(String, SoapFaultDefinition)>,
    default_fault: Option<SoapFaultDefinition>,
}

impl SoapFaultMappingExceptionResolver {
    /// Creates a resolver without mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping.
    #[must_use]
    pub fn mapping(mut self, key: impl Into<String>, definition: SoapFaultDefinition) -> Self {
        self.mappings.push((key.into(), definition));
        self
    }

    /// Adds a mapping from its textual definition.
    pub fn mapping_str(self, key: impl Into<String>, definition: &str) -> WsResult<Self> {
        Ok(self.mapping(key, definition.parse()?))
    }

    /// Sets the fault used when no mapping matches.
    #[must_use]
    pub fn default_fault(mut self, definition: SoapFaultDefinition) -> Self {
        self.default_fault = Some(definition);
        self
    }

    /// Replaces the shared settings.
    #[must_use]
    pub fn support(mut self, support: ResolverSupport) -> Self {
        self.support = support;
        self
    }

    /// Returns the definition that applies to `error`.
    #[must_use]
    pub fn fault_definition(&self, error: &WsError) -> Option<&SoapFaultDefinition> {
        let mut best: Option<(u8, &SoapFaultDefinition)> = None;
        for (key, definition) in &self.mappings {
            let depth = if error.kind() == Some(key.as_str()) {
                0
            } else if error.code.as_str() == key {
                1
            } else {
                continue;
            };
            if best.is_none_or(|(best_depth, _)| depth < best_depth) {
                best = Some((depth, definition));
            }
        }
        best.map(|(_, definition)| definition)
            .or(self.default_fault.as_ref())
    }
}

impl EndpointExceptionResolver for SoapFaultMappingExceptionResolver {
    fn resolve_exception(
        &self,
        ctx: &mut MessageContext,
        endpoint: &Endpoint,
        error: &WsError,
    ) -> bool {
        self.support.resolve_with(endpoint, error, || {
            let Some(definition) = self.fault_definition(error) else {
                debug!(target: targets::RESOLVER, "No fault mapping for [{}]", error);
                return false;
            };
            write_fault(ctx, definition.to_fault(error))
        })
    }

    fn order(&self) -> i32 {
        self.support.order()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wsdispatch_core::WebServiceMessage;
    use wsdispatch_protocol::{SoapMessage, SoapMessageFactory};

    use super::*;

    fn ctx() -> MessageContext {
        SoapMessageFactory::default().create_context(SoapMessage::default())
    }

    fn fault_of(ctx: &MessageContext) -> Option<SoapFault> {
        ctx.response_if_present()
            .and_then(|r| r.as_fault_aware())
            .and_then(|f| f.fault())
            .cloned()
    }

    fn endpoint() -> Endpoint {
        Endpoint::custom("orders", ())
    }

    #[test]
    fn simple_resolver_writes_receiver_fault() {
        let mut ctx = ctx();
        let err = WsError::endpoint("database unavailable");
        assert!(SimpleSoapExceptionResolver::new().resolve_exception(&mut ctx, &endpoint(), &err));

        let fault = fault_of(&ctx).unwrap();
        assert_eq!(fault.code, FaultCode::Receiver);
        assert_eq!(fault.reason, "database unavailable");
        assert_eq!(fault.lang.as_deref(), Some("en"));
    }

    #[test]
    fn mapped_endpoints_restrict_resolution() {
        let resolver = SimpleSoapExceptionResolver::new()
            .support(ResolverSupport::default().mapped_endpoints(["billing"]));
        let mut ctx = ctx();
        assert!(!resolver.resolve_exception(&mut ctx, &endpoint(), &WsError::endpoint("x")));
        assert!(!ctx.has_response());
    }

    #[test]
    fn definition_parsing() {
        let def: SoapFaultDefinition = "SERVER".parse().unwrap();
        assert_eq!(def, SoapFaultDefinition::receiver(""));

        let def: SoapFaultDefinition = "CLIENT, Invalid order ,en".parse().unwrap();
        assert_eq!(def.code, FaultCode::Sender);
        assert_eq!(def.reason, "Invalid order");
        assert_eq!(def.lang.as_deref(), Some("en"));

        let def: SoapFaultDefinition = "{urn:app}Quota,Too many".parse().unwrap();
        assert_eq!(def.code, FaultCode::Custom(QName::new("urn:app", "Quota")));

        assert!("".parse::<SoapFaultDefinition>().is_err());
        assert!("Quota,x".parse::<SoapFaultDefinition>().is_err());
        assert!("SERVER,a,b,c".parse::<SoapFaultDefinition>().is_err());
    }

    #[test]
    fn closest_mapping_wins() {
        let resolver = SoapFaultMappingExceptionResolver::new()
            .mapping_str("EndpointInvocation", "SERVER,generic failure")
            .unwrap()
            .mapping_str("ValidationError", "CLIENT")
            .unwrap()
            .default_fault(SoapFaultDefinition::receiver("unexpected"));

        let validation = WsError::endpoint("field [qty] is negative").with_kind("ValidationError");
        let def = resolver.fault_definition(&validation).unwrap();
        assert_eq!(def.code, FaultCode::Sender);
        assert_eq!(def.to_fault(&validation).reason, "field [qty] is negative");

        let plain = WsError::endpoint("boom");
        assert_eq!(resolver.fault_definition(&plain).unwrap().reason, "generic failure");

        let other = WsError::internal("boom");
        assert_eq!(resolver.fault_definition(&other).unwrap().reason, "unexpected");
    }

    #[test]
    fn mapping_resolver_without_default_declines() {
        let resolver = SoapFaultMappingExceptionResolver::new()
            .mapping("ValidationError", SoapFaultDefinition::sender(""));
        let mut ctx = ctx();
        assert!(!resolver.resolve_exception(&mut ctx, &endpoint(), &WsError::endpoint("x")));

        let err = WsError::endpoint("bad").with_kind("ValidationError");
        assert!(resolver.resolve_exception(&mut ctx, &endpoint(), &err));
        assert_eq!(fault_of(&ctx).unwrap().code, FaultCode::Sender);
    }

    #[derive(Clone)]
    struct Recording {
        name: &'static str,
        order: i32,
        result: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl EndpointExceptionResolver for Recording {
        fn resolve_exception(&self, _: &mut MessageContext, _: &Endpoint, _: &WsError) -> bool {
            self.calls.lock().unwrap().push(self.name);
            self.result
        }

        fn order(&self) -> i32 {
            self.order
        }
    }

    #[test]
    fn composite_sorts_by_order_and_stops_at_first_claim() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let make = |name, order, result| Recording {
            name,
            order,
            result,
            calls: calls.clone(),
        };
        let composite = CompositeEndpointExceptionResolver::new(vec![
            Arc::new(make("late", 10, true)),
            Arc::new(make("early", 1, false)),
            Arc::new(make("tie", 10, true)),
        ]);

        let mut ctx = ctx();
        assert!(composite.resolve_exception(&mut ctx, &endpoint(), &WsError::endpoint("x")));
        assert_eq!(*calls.lock().unwrap(), vec!["early", "late"]);
    }

    #[test]
    fn non_fault_aware_response_declines() {
        #[derive(Debug, Default)]
        struct Bare;
        impl WebServiceMessage for Bare {
            fn payload(&self) -> Option<&wsdispatch_core::Payload> {
                None
            }
            fn set_payload(&mut self, _: wsdispatch_core::Payload) {}
            fn write_to(&self, _: &mut dyn std::io::Write) -> std::io::Result<()> {
                Ok(())
            }
        }

        let factory: Arc<dyn wsdispatch_core::MessageFactory> =
            Arc::new(|| Box::new(Bare) as Box<dyn WebServiceMessage>);
        let mut ctx = MessageContext::new(Bare, factory);
        assert!(!write_fault(&mut ctx, SoapFault::receiver("x")));
    }
}
