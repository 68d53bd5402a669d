//! Endpoint interceptors.
//!
//! Interceptors wrap endpoint invocation. The dispatcher calls
//! [`handle_request`](EndpointInterceptor::handle_request) front to back
//! before the endpoint runs; returning `false` short-circuits the chain.
//! Response, fault and completion callbacks run back to front, starting
//! from the last interceptor whose request callback returned.
//!
//! Every callback has a pass-through default, so an interceptor only
//! implements the phases it cares about.

use std::fmt;
use std::sync::Arc;

use wsdispatch_core::logging::{debug, is_enabled, targets, Level};
use wsdispatch_core::{HeaderElement, MessageContext, Payload, WsError, WsResult};

use crate::Endpoint;
use crate::mapping::{normalize_soap_action, request_soap_action};

/// Interceptor around endpoint invocation.
pub trait EndpointInterceptor: Send + Sync {
    /// Processes the request before the endpoint runs.
    ///
    /// Return `false` to stop the chain: later interceptors and the endpoint
    /// are skipped, but this interceptor still gets its response, fault and
    /// completion callbacks.
    fn handle_request(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        Ok(true)
    }

    /// Processes a non-fault response. Return `false` to stop propagation.
    fn handle_response(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        Ok(true)
    }

    /// Processes a fault response. Return `false` to stop propagation.
    fn handle_fault(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        Ok(true)
    }

    /// Called once dispatch is complete, whatever the outcome.
    ///
    /// `error` is the unhandled dispatch error, if any.
    fn after_completion(
        &self,
        _ctx: &mut MessageContext,
        _endpoint: &Endpoint,
        _error: Option<&WsError>,
    ) -> WsResult<()> {
        Ok(())
    }

    /// Returns whether this interceptor processes the given mandatory header.
    fn understands(&self, _header: &HeaderElement) -> bool {
        false
    }
}

// ============================================================================
// Smart interceptors
// ============================================================================

/// Decides whether a smart interceptor applies to a request.
#[derive(Clone)]
pub enum InterceptPredicate {
    /// Payload root namespace matches and, if given, the local part too.
    PayloadRoot {
        /// Required namespace URI.
        namespace_uri: String,
        /// Required local part, any when `None`.
        local_part: Option<String>,
    },
    /// Request SOAPAction equals this value.
    SoapAction(String),
    /// Endpoint name equals this value.
    EndpointName(String),
    /// Arbitrary predicate.
    Custom(Arc<dyn Fn(&MessageContext, &Endpoint) -> bool + Send + Sync>),
}

impl InterceptPredicate {
    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, ctx: &MessageContext, endpoint: &Endpoint) -> bool {
        match self {
            Self::PayloadRoot {
                namespace_uri,
                local_part,
            } => ctx.request().payload_root().is_some_and(|root| {
                root.namespace_uri == *namespace_uri
                    && local_part.as_ref().is_none_or(|local| root.local_part == *local)
            }),
            Self::SoapAction(action) => request_soap_action(ctx)
                .is_some_and(|received| normalize_soap_action(action) == Some(received)),
            Self::EndpointName(name) => endpoint.name() == name,
            Self::Custom(predicate) => predicate(ctx, endpoint),
        }
    }
}

impl fmt::Debug for InterceptPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadRoot {
                namespace_uri,
                local_part,
            } => f
                .debug_struct("PayloadRoot")
                .field("namespace_uri", namespace_uri)
                .field("local_part", local_part)
                .finish(),
            Self::SoapAction(action) => f.debug_tuple("SoapAction").field(action).finish(),
            Self::EndpointName(name) => f.debug_tuple("EndpointName").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// An interceptor that a mapping adds to a chain only when its predicate
/// matches the request.
#[derive(Clone)]
pub struct SmartInterceptor {
    interceptor: Arc<dyn EndpointInterceptor>,
    predicate: InterceptPredicate,
}

impl SmartInterceptor {
    /// Pairs an interceptor with a predicate.
    pub fn new<I: EndpointInterceptor + 'static>(interceptor: I, predicate: InterceptPredicate) -> Self {
        Self::from_arc(Arc::new(interceptor), predicate)
    }

    /// Pairs a shared interceptor with a predicate.
    #[must_use]
    pub fn from_arc(interceptor: Arc<dyn EndpointInterceptor>, predicate: InterceptPredicate) -> Self {
        Self {
            interceptor,
            predicate,
        }
    }

    /// Applies to requests whose payload root is in `namespace_uri`.
    pub fn for_namespace<I: EndpointInterceptor + 'static>(
        interceptor: I,
        namespace_uri: impl Into<String>,
    ) -> Self {
        Self::new(
            interceptor,
            InterceptPredicate::PayloadRoot {
                namespace_uri: namespace_uri.into(),
                local_part: None,
            },
        )
    }

    /// Applies to requests carrying the given SOAPAction.
    pub fn for_soap_action<I: EndpointInterceptor + 'static>(
        interceptor: I,
        action: impl Into<String>,
    ) -> Self {
        Self::new(interceptor, InterceptPredicate::SoapAction(action.into()))
    }

    /// Applies to requests mapped to the named endpoint.
    pub fn for_endpoint<I: EndpointInterceptor + 'static>(
        interceptor: I,
        endpoint_name: impl Into<String>,
    ) -> Self {
        Self::new(interceptor, InterceptPredicate::EndpointName(endpoint_name.into()))
    }

    /// Applies when `predicate` returns true.
    pub fn when<I, F>(interceptor: I, predicate: F) -> Self
    where
        I: EndpointInterceptor + 'static,
        F: Fn(&MessageContext, &Endpoint) -> bool + Send + Sync + 'static,
    {
        Self::new(interceptor, InterceptPredicate::Custom(Arc::new(predicate)))
    }

    /// Returns whether the interceptor applies to this request.
    #[must_use]
    pub fn should_intercept(&self, ctx: &MessageContext, endpoint: &Endpoint) -> bool {
        self.predicate.matches(ctx, endpoint)
    }

    /// Returns the wrapped interceptor.
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn EndpointInterceptor> {
        &self.interceptor
    }
}

impl fmt::Debug for SmartInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartInterceptor")
            .field("predicate", &self.predicate)
            .finish()
    }
}

// ============================================================================
// Payload logging
// ============================================================================

/// Logs request, response and fault payloads at DEBUG.
///
/// Always lets the exchange proceed.
#[derive(Debug, Clone)]
pub struct PayloadLoggingInterceptor {
    target: String,
    log_request: bool,
    log_response: bool,
    log_fault: bool,
}

impl Default for PayloadLoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadLoggingInterceptor {
    /// Logs every phase under the interceptor target.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: targets::INTERCEPTOR.to_string(),
            log_request: true,
            log_response: true,
            log_fault: true,
        }
    }

    /// Sets the log target.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Sets whether requests are logged.
    #[must_use]
    pub fn log_request(mut self, enabled: bool) -> Self {
        self.log_request = enabled;
        self
    }

    /// Sets whether responses are logged.
    #[must_use]
    pub fn log_response(mut self, enabled: bool) -> Self {
        self.log_response = enabled;
        self
    }

    /// Sets whether faults are logged.
    #[must_use]
    pub fn log_fault(mut self, enabled: bool) -> Self {
        self.log_fault = enabled;
        self
    }

    fn log_payload(&self, label: &str, payload: Option<&Payload>) {
        if !is_enabled(Level::Debug, &self.target) {
            return;
        }
        let rendered = match payload {
            Some(payload) => serde_json::to_string(payload)
                .unwrap_or_else(|err| format!("<unrenderable payload: {err}>")),
            None => "<empty>".to_string(),
        };
        debug!(target: self.target.as_str(), "{label}: {rendered}");
    }
}

impl EndpointInterceptor for PayloadLoggingInterceptor {
    fn handle_request(&self, ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        if self.log_request {
            self.log_payload("Request", ctx.request().payload());
        }
        Ok(true)
    }

    fn handle_response(&self, ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        if self.log_response {
            self.log_payload("Response", ctx.response_if_present().and_then(|r| r.payload()));
        }
        Ok(true)
    }

    fn handle_fault(&self, ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        if self.log_fault && is_enabled(Level::Debug, &self.target) {
            let fault = ctx
                .response_if_present()
                .and_then(|r| r.as_fault_aware())
                .and_then(|f| f.fault())
                .map(|f| format!("{} {}", f.code, f.reason));
            debug!(target: self.target.as_str(), "Fault: {}", fault.as_deref().unwrap_or("<none>"));
        }
        Ok(true)
    }
}
