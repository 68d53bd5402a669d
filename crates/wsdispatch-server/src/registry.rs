//! Component registry used for strategy discovery.
//!
//! Applications register named mappings, adapters and resolvers here and let
//! [`MessageDispatcherBuilder::discover`](crate::MessageDispatcherBuilder::discover)
//! pick them up, sorted by their `order()`.

use std::fmt;
use std::sync::Arc;

use wsdispatch_core::{WsError, WsResult};

use crate::{EndpointAdapter, EndpointExceptionResolver, EndpointMapping};

struct Named<T: ?Sized> {
    name: String,
    component: Arc<T>,
}

/// Named dispatch strategies, in registration order.
#[derive(Default)]
pub struct ComponentRegistry {
    mappings: Vec<Named<dyn EndpointMapping>>,
    adapters: Vec<Named<dyn EndpointAdapter>>,
    resolvers: Vec<Named<dyn EndpointExceptionResolver>>,
}

fn register<T: ?Sized>(
    kind: &str,
    list: &mut Vec<Named<T>>,
    name: String,
    component: Arc<T>,
) -> WsResult<()> {
    if list.iter().any(|entry| entry.name == name) {
        return Err(WsError::configuration(format!(
            "{kind} [{name}] is already registered"
        )));
    }
    list.push(Named { name, component });
    Ok(())
}

fn sorted<T: ?Sized>(list: &[Named<T>], order: impl Fn(&T) -> i32) -> Vec<Arc<T>> {
    let mut components: Vec<Arc<T>> = list.iter().map(|entry| Arc::clone(&entry.component)).collect();
    components.sort_by_key(|component| order(component.as_ref()));
    components
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping. Names are unique per component kind.
    pub fn register_mapping<M: EndpointMapping + 'static>(
        &mut self,
        name: impl Into<String>,
        mapping: M,
    ) -> WsResult<()> {
        let mapping: Arc<dyn EndpointMapping> = Arc::new(mapping);
        register("endpoint mapping", &mut self.mappings, name.into(), mapping)
    }

    /// Registers an adapter.
    pub fn register_adapter<A: EndpointAdapter + 'static>(
        &mut self,
        name: impl Into<String>,
        adapter: A,
    ) -> WsResult<()> {
        let adapter: Arc<dyn EndpointAdapter> = Arc::new(adapter);
        register("endpoint adapter", &mut self.adapters, name.into(), adapter)
    }

    /// Registers an exception resolver.
    pub fn register_resolver<R: EndpointExceptionResolver + 'static>(
        &mut self,
        name: impl Into<String>,
        resolver: R,
    ) -> WsResult<()> {
        let resolver: Arc<dyn EndpointExceptionResolver> = Arc::new(resolver);
        register("exception resolver", &mut self.resolvers, name.into(), resolver)
    }

    /// Returns the mapping registered under `name`.
    #[must_use]
    pub fn mapping(&self, name: &str) -> Option<Arc<dyn EndpointMapping>> {
        self.mappings
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.component))
    }

    /// Returns all mappings, stably sorted by order.
    #[must_use]
    pub fn mappings(&self) -> Vec<Arc<dyn EndpointMapping>> {
        sorted(&self.mappings, |m| m.order())
    }

    /// Returns all adapters, stably sorted by order.
    #[must_use]
    pub fn adapters(&self) -> Vec<Arc<dyn EndpointAdapter>> {
        sorted(&self.adapters, |a| a.order())
    }

    /// Returns all resolvers, stably sorted by order.
    #[must_use]
    pub fn resolvers(&self) -> Vec<Arc<dyn EndpointExceptionResolver>> {
        sorted(&self.resolvers, |r| r.order())
    }

    /// Returns the registered component names per kind.
    #[must_use]
    pub fn names(&self) -> (Vec<&str>, Vec<&str>, Vec<&str>) {
        (
            self.mappings.iter().map(|e| e.name.as_str()).collect(),
            self.adapters.iter().map(|e| e.name.as_str()).collect(),
            self.resolvers.iter().map(|e| e.name.as_str()).collect(),
        )
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mappings, adapters, resolvers) = self.names();
        f.debug_struct("ComponentRegistry")
            .field("mappings", &mappings)
            .field("adapters", &adapters)
            .field("resolvers", &resolvers)
            .finish()
    }
}
