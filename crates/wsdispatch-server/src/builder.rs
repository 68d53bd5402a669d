//! Builder for configuring message dispatchers.

use std::sync::Arc;

use wsdispatch_core::WebServiceMessage;
use wsdispatch_core::logging::{debug, info, targets};

use crate::dispatcher::FaultClassifier;
use crate::{
    AfterCompletionPolicy, ComponentRegistry, DispatchObserver, DispatcherConfig,
    EndpointAdapter, EndpointExceptionResolver, EndpointMapping, MessageDispatcher,
    MessageEndpointAdapter, MessageTracingObserver, MustUnderstandConfig, PayloadEndpointAdapter,
    SimpleSoapExceptionResolver,
};

/// Default dispatcher name.
const DEFAULT_NAME: &str = "wsdispatch";

/// Builder for configuring a [`MessageDispatcher`].
///
/// Strategy lists keep registration order, which is also trial order. A list
/// that is never configured, explicitly or through
/// [`discover`](Self::discover), falls back to the defaults:
/// - mappings: none
/// - adapters: [`MessageEndpointAdapter`], [`PayloadEndpointAdapter`]
/// - resolvers: [`SimpleSoapExceptionResolver`]
pub struct MessageDispatcherBuilder {
    name: String,
    mappings: Option<Vec<Arc<dyn EndpointMapping>>>,
    adapters: Option<Vec<Arc<dyn EndpointAdapter>>>,
    resolvers: Option<Vec<Arc<dyn EndpointExceptionResolver>>>,
    observer: Arc<dyn DispatchObserver>,
    fault_classifier: Option<FaultClassifier>,
    must_understand: MustUnderstandConfig,
    after_completion: AfterCompletionPolicy,
}

impl Default for MessageDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDispatcherBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            mappings: None,
            adapters: None,
            resolvers: None,
            observer: Arc::new(MessageTracingObserver),
            fault_classifier: None,
            must_understand: MustUnderstandConfig::default(),
            after_completion: AfterCompletionPolicy::default(),
        }
    }

    /// Sets the dispatcher name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends an endpoint mapping.
    #[must_use]
    pub fn mapping<M: EndpointMapping + 'static>(mut self, mapping: M) -> Self {
        self.mappings
            .get_or_insert_with(Vec::new)
            .push(Arc::new(mapping));
        self
    }

    /// Replaces the endpoint mappings.
    #[must_use]
    pub fn mappings(mut self, mappings: Vec<Arc<dyn EndpointMapping>>) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Appends an endpoint adapter.
    #[must_use]
    pub fn adapter<A: EndpointAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters
            .get_or_insert_with(Vec::new)
            .push(Arc::new(adapter));
        self
    }

    /// Replaces the endpoint adapters.
    #[must_use]
    pub fn adapters(mut self, adapters: Vec<Arc<dyn EndpointAdapter>>) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Appends an exception resolver.
    #[must_use]
    pub fn resolver<R: EndpointExceptionResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers
            .get_or_insert_with(Vec::new)
            .push(Arc::new(resolver));
        self
    }

    /// Replaces the exception resolvers. An empty list disables resolution.
    #[must_use]
    pub fn resolvers(mut self, resolvers: Vec<Arc<dyn EndpointExceptionResolver>>) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    /// Sets the lifecycle observer. Defaults to [`MessageTracingObserver`].
    #[must_use]
    pub fn observer<O: DispatchObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Overrides how responses are classified as faults.
    ///
    /// By default a response is a fault when its fault-aware view reports one.
    #[must_use]
    pub fn fault_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&dyn WebServiceMessage) -> bool + Send + Sync + 'static,
    {
        self.fault_classifier = Some(Arc::new(classifier));
        self
    }

    /// Sets mustUnderstand processing.
    #[must_use]
    pub fn must_understand(mut self, config: MustUnderstandConfig) -> Self {
        self.must_understand = config;
        self
    }

    /// Enables or disables mustUnderstand processing.
    #[must_use]
    pub fn must_understand_enabled(mut self, enabled: bool) -> Self {
        self.must_understand.enabled = enabled;
        self
    }

    /// Sets how after_completion errors are reported.
    #[must_use]
    pub fn after_completion(mut self, policy: AfterCompletionPolicy) -> Self {
        self.after_completion = policy;
        self
    }

    /// Applies name, mustUnderstand and after_completion settings.
    #[must_use]
    pub fn config(mut self, config: &DispatcherConfig) -> Self {
        self.name.clone_from(&config.name);
        self.must_understand = config.must_understand.clone();
        self.after_completion = config.after_completion;
        self
    }

    /// Fills every strategy list not configured yet from `registry`.
    #[must_use]
    pub fn discover(mut self, registry: &ComponentRegistry) -> Self {
        if self.mappings.is_none() {
            let found = registry.mappings();
            if !found.is_empty() {
                debug!(target: targets::DISPATCHER, "Discovered {} endpoint mapping(s)", found.len());
                self.mappings = Some(found);
            }
        }
        if self.adapters.is_none() {
            let found = registry.adapters();
            if !found.is_empty() {
                debug!(target: targets::DISPATCHER, "Discovered {} endpoint adapter(s)", found.len());
                self.adapters = Some(found);
            }
        }
        if self.resolvers.is_none() {
            let found = registry.resolvers();
            if !found.is_empty() {
                debug!(target: targets::DISPATCHER, "Discovered {} exception resolver(s)", found.len());
                self.resolvers = Some(found);
            }
        }
        self
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> MessageDispatcher {
        let mappings = self.mappings.unwrap_or_else(|| {
            debug!(target: targets::DISPATCHER, "No endpoint mappings configured");
            Vec::new()
        });
        let adapters = self.adapters.unwrap_or_else(|| {
            debug!(target: targets::DISPATCHER, "No endpoint adapters configured, using defaults");
            vec![
                Arc::new(MessageEndpointAdapter) as Arc<dyn EndpointAdapter>,
                Arc::new(PayloadEndpointAdapter),
            ]
        });
        let resolvers = self.resolvers.unwrap_or_else(|| {
            debug!(target: targets::DISPATCHER, "No exception resolvers configured, using defaults");
            vec![Arc::new(SimpleSoapExceptionResolver::new()) as Arc<dyn EndpointExceptionResolver>]
        });

        info!(
            target: targets::DISPATCHER,
            "Dispatcher [{}] ready: {} mapping(s), {} adapter(s), {} resolver(s)",
            self.name,
            mappings.len(),
            adapters.len(),
            resolvers.len()
        );

        MessageDispatcher {
            name: self.name,
            mappings,
            adapters,
            resolvers,
            observer: self.observer,
            fault_classifier: self.fault_classifier,
            must_understand: self.must_understand,
            after_completion: self.after_completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnEndpointMapping, PayloadRootQNameEndpointMapping};

    #[test]
    fn defaults_apply_to_unconfigured_lists() {
        let dispatcher = MessageDispatcherBuilder::new().build();
        assert_eq!(dispatcher.name(), DEFAULT_NAME);
        assert!(dispatcher.mappings().is_empty());
        assert_eq!(dispatcher.adapters().len(), 2);
        assert_eq!(dispatcher.resolvers().len(), 1);
    }

    #[test]
    fn explicit_empty_list_is_kept() {
        let dispatcher = MessageDispatcherBuilder::new()
            .resolvers(Vec::new())
            .adapters(Vec::new())
            .build();
        assert!(dispatcher.resolvers().is_empty());
        assert!(dispatcher.adapters().is_empty());
    }

    #[test]
    fn discover_fills_only_unconfigured_lists() {
        let mut registry = ComponentRegistry::new();
        registry
            .register_mapping("roots", PayloadRootQNameEndpointMapping::new())
            .unwrap();
        registry
            .register_resolver("simple", SimpleSoapExceptionResolver::new())
            .unwrap();
        registry.register_adapter("message", MessageEndpointAdapter).unwrap();

        let dispatcher = MessageDispatcherBuilder::new()
            .mapping(FnEndpointMapping::new(|_| Ok(None)))
            .mapping(FnEndpointMapping::new(|_| Ok(None)))
            .discover(&registry)
            .build();

        assert_eq!(dispatcher.mappings().len(), 2);
        assert_eq!(dispatcher.adapters().len(), 1);
        assert_eq!(dispatcher.resolvers().len(), 1);
    }

    #[test]
    fn empty_registry_keeps_defaults() {
        let dispatcher = MessageDispatcherBuilder::new()
            .discover(&ComponentRegistry::new())
            .build();
        assert_eq!(dispatcher.adapters().len(), 2);
        assert_eq!(dispatcher.resolvers().len(), 1);
    }

    #[test]
    fn config_is_applied() {
        let config = DispatcherConfig {
            name: "orders".into(),
            after_completion: AfterCompletionPolicy::LogAndContinue,
            ..DispatcherConfig::default()
        };
        let dispatcher = MessageDispatcherBuilder::new()
            .config(&config)
            .must_understand_enabled(false)
            .build();
        assert_eq!(dispatcher.name(), "orders");
        assert_eq!(dispatcher.after_completion_policy(), AfterCompletionPolicy::LogAndContinue);
        assert!(!dispatcher.must_understand_config().enabled);
    }
}
