//! The message dispatcher.
//!
//! [`MessageDispatcher::dispatch`] drives one exchange through the pipeline:
//!
//! 1. Ask each mapping in turn for an invocation chain; the first match wins.
//! 2. Pick the first adapter that supports the chain's endpoint.
//! 3. Check mandatory headers (when enabled).
//! 4. Run request interceptors front to back until one returns `false`.
//! 5. Invoke the endpoint unless intercepted or a response already exists.
//!    Invocation errors are offered to the exception resolvers.
//! 6. If there is a response, run response or fault callbacks back to front.
//! 7. Run completion callbacks back to front for every interceptor whose
//!    request callback returned.
//!
//! Steps 4 to 6 operate on the *interceptor index*: the position of the last
//! interceptor whose `handle_request` returned, with either boolean.

use std::fmt;
use std::sync::Arc;

use wsdispatch_core::logging::{Level, debug, is_enabled, targets, warn};
use wsdispatch_core::{MessageContext, WebServiceMessage, WsError, WsResult};

use crate::must_understand::process_headers;
use crate::{
    AfterCompletionPolicy, DispatchObserver, Endpoint, EndpointAdapter,
    EndpointExceptionResolver, EndpointInvocationChain, EndpointMapping,
    MessageDispatcherBuilder, MustUnderstandConfig, ReceivedRequest, describe,
};

/// Decides whether a response is a fault.
pub type FaultClassifier = Arc<dyn Fn(&dyn WebServiceMessage) -> bool + Send + Sync>;

/// Routes request messages to endpoints.
///
/// Immutable once built and safe to share between threads; each call to
/// [`dispatch`](Self::dispatch) works only on the context it is given.
pub struct MessageDispatcher {
    pub(crate) name: String,
    pub(crate) mappings: Vec<Arc<dyn EndpointMapping>>,
    pub(crate) adapters: Vec<Arc<dyn EndpointAdapter>>,
    pub(crate) resolvers: Vec<Arc<dyn EndpointExceptionResolver>>,
    pub(crate) observer: Arc<dyn DispatchObserver>,
    pub(crate) fault_classifier: Option<FaultClassifier>,
    pub(crate) must_understand: MustUnderstandConfig,
    pub(crate) after_completion: AfterCompletionPolicy,
}

impl MessageDispatcher {
    /// Creates a new dispatcher builder.
    #[must_use]
    pub fn builder() -> MessageDispatcherBuilder {
        MessageDispatcherBuilder::new()
    }

    /// Returns the dispatcher name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the endpoint mappings in trial order.
    #[must_use]
    pub fn mappings(&self) -> &[Arc<dyn EndpointMapping>] {
        &self.mappings
    }

    /// Returns the endpoint adapters in trial order.
    #[must_use]
    pub fn adapters(&self) -> &[Arc<dyn EndpointAdapter>] {
        &self.adapters
    }

    /// Returns the exception resolvers in trial order.
    #[must_use]
    pub fn resolvers(&self) -> &[Arc<dyn EndpointExceptionResolver>] {
        &self.resolvers
    }

    /// Returns the mustUnderstand settings.
    #[must_use]
    pub fn must_understand_config(&self) -> &MustUnderstandConfig {
        &self.must_understand
    }

    /// Returns the after_completion error policy.
    #[must_use]
    pub fn after_completion_policy(&self) -> AfterCompletionPolicy {
        self.after_completion
    }

    /// Transport-facing entry point.
    ///
    /// Notifies the observer, dispatches, then reports whether a response
    /// was produced. The request is captured before dispatch since
    /// interceptors may change it.
    pub fn receive(&self, ctx: &mut MessageContext) -> WsResult<()> {
        self.observer.request_received(ctx);
        let request = ReceivedRequest::capture(
            ctx.request(),
            is_enabled(Level::Trace, targets::TRACING_SENT),
        );
        self.dispatch(ctx)?;
        if ctx.has_response() {
            self.observer.response_sent(ctx, &request);
        } else {
            self.observer.no_response(ctx, &request);
        }
        Ok(())
    }

    /// Dispatches one request.
    ///
    /// Returns `Err` for routing failures, interceptor errors, unresolved
    /// endpoint errors, and (under [`AfterCompletionPolicy::PropagateFirst`])
    /// completion callback errors.
    pub fn dispatch(&self, ctx: &mut MessageContext) -> WsResult<()> {
        let chain = self.resolve_chain(ctx)?;
        let endpoint = chain.endpoint();
        let adapter = self.select_adapter(endpoint)?;

        if self.must_understand.enabled && !process_headers(ctx, &chain, &self.must_understand)? {
            return Ok(());
        }

        let mut index = None;
        let result = self.run_chain(ctx, &chain, adapter.as_ref(), &mut index);
        self.complete(ctx, &chain, index, result)
    }

    fn resolve_chain(&self, ctx: &MessageContext) -> WsResult<EndpointInvocationChain> {
        for mapping in &self.mappings {
            if let Some(chain) = mapping.endpoint(ctx)? {
                wsdispatch_core::log_dispatcher!(
                    "Endpoint mapping resolved request to endpoint [{}] with {} interceptor(s)",
                    chain.endpoint(),
                    chain.interceptors().len()
                );
                return Ok(chain);
            }
        }

        let request = describe(ctx.request());
        warn!(
            target: targets::ENDPOINT_NOT_FOUND,
            "No endpoint mapping found for [{}]", request
        );
        self.observer.endpoint_not_found(ctx);
        Err(WsError::no_endpoint_found(request))
    }

    fn select_adapter(&self, endpoint: &Endpoint) -> WsResult<Arc<dyn EndpointAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.supports(endpoint))
            .map(Arc::clone)
            .ok_or_else(|| WsError::no_endpoint_adapter(endpoint))
    }

    fn run_chain(
        &self,
        ctx: &mut MessageContext,
        chain: &EndpointInvocationChain,
        adapter: &dyn EndpointAdapter,
        index: &mut Option<usize>,
    ) -> WsResult<()> {
        let endpoint = chain.endpoint();

        let mut intercepted = false;
        for (i, interceptor) in chain.interceptors().iter().enumerate() {
            let proceed = interceptor.handle_request(ctx, endpoint)?;
            *index = Some(i);
            if !proceed {
                debug!(
                    target: targets::INTERCEPTOR,
                    "Interceptor {} of endpoint [{}] stopped request processing", i, endpoint
                );
                intercepted = true;
                break;
            }
        }

        if !intercepted && !ctx.has_response() {
            wsdispatch_core::log_adapter!("Invoking endpoint [{}]", endpoint);
            if let Err(err) = adapter.invoke(ctx, endpoint) {
                if !self.resolve_exception(ctx, endpoint, &err) {
                    return Err(err);
                }
            }
        }

        self.trigger_handle_response(ctx, chain, *index)
    }

    fn resolve_exception(
        &self,
        ctx: &mut MessageContext,
        endpoint: &Endpoint,
        error: &WsError,
    ) -> bool {
        for resolver in &self.resolvers {
            if resolver.resolve_exception(ctx, endpoint, error) {
                wsdispatch_core::log_resolver!(
                    "Resolved error of endpoint [{}]: {}",
                    endpoint,
                    error
                );
                self.observer.exception_resolved(ctx, endpoint, error);
                return true;
            }
        }
        warn!(
            target: targets::DISPATCHER,
            "Endpoint [{}] failed with unresolved error: {}", endpoint, error
        );
        false
    }

    fn is_fault(&self, ctx: &MessageContext) -> bool {
        let Some(response) = ctx.response_if_present() else {
            return false;
        };
        match &self.fault_classifier {
            Some(classify) => classify(response),
            None => response.as_fault_aware().is_some_and(|f| f.has_fault()),
        }
    }

    fn trigger_handle_response(
        &self,
        ctx: &mut MessageContext,
        chain: &EndpointInvocationChain,
        index: Option<usize>,
    ) -> WsResult<()> {
        let Some(last) = index else {
            return Ok(());
        };
        if !ctx.has_response() {
            return Ok(());
        }

        let endpoint = chain.endpoint();
        let is_fault = self.is_fault(ctx);
        for interceptor in chain.interceptors()[..=last].iter().rev() {
            let proceed = if is_fault {
                interceptor.handle_fault(ctx, endpoint)?
            } else {
                interceptor.handle_response(ctx, endpoint)?
            };
            if !proceed {
                break;
            }
        }
        Ok(())
    }

    fn complete(
        &self,
        ctx: &mut MessageContext,
        chain: &EndpointInvocationChain,
        index: Option<usize>,
        result: WsResult<()>,
    ) -> WsResult<()> {
        let Some(last) = index else {
            return result;
        };

        let endpoint = chain.endpoint();
        let error = result.as_ref().err();
        let mut first_failure = None;
        for interceptor in chain.interceptors()[..=last].iter().rev() {
            if let Err(err) = interceptor.after_completion(ctx, endpoint, error) {
                warn!(
                    target: targets::INTERCEPTOR,
                    "after_completion failed for endpoint [{}]: {}", endpoint, err
                );
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }

        match (result, first_failure) {
            (Err(err), _) => Err(err),
            (Ok(()), Some(err)) if self.after_completion == AfterCompletionPolicy::PropagateFirst => {
                Err(err)
            }
            (Ok(()), _) => Ok(()),
        }
    }
}

impl fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("name", &self.name)
            .field("mappings", &self.mappings.len())
            .field("adapters", &self.adapters.len())
            .field("resolvers", &self.resolvers.len())
            .field("custom_fault_classifier", &self.fault_classifier.is_some())
            .field("must_understand", &self.must_understand)
            .field("after_completion", &self.after_completion)
            .finish()
    }
}
