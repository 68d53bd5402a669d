//! Endpoint invocation chains.

use std::fmt;
use std::sync::Arc;

use crate::{Endpoint, EndpointInterceptor};

/// An endpoint together with the interceptors that wrap its invocation.
///
/// Interceptor order is preserved exactly: request callbacks run front to
/// back, response, fault and completion callbacks back to front.
#[derive(Clone)]
pub struct EndpointInvocationChain {
    endpoint: Endpoint,
    interceptors: Vec<Arc<dyn EndpointInterceptor>>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: bool,
}

impl EndpointInvocationChain {
    /// Creates a chain without interceptors.
    ///
    /// The chain acts as ultimate receiver with no additional actors or roles.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            interceptors: Vec::new(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
        }
    }

    /// Replaces the interceptors.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn EndpointInterceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn interceptor<I: EndpointInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Sets the SOAP actors (1.1) or roles (1.2) this chain acts in.
    #[must_use]
    pub fn with_actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
        self.actors_or_roles = actors_or_roles;
        self
    }

    /// Sets whether this chain acts as the ultimate receiver.
    #[must_use]
    pub fn ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
        self.ultimate_receiver = ultimate_receiver;
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the interceptors in invocation order.
    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn EndpointInterceptor>] {
        &self.interceptors
    }

    /// Returns the actors or roles.
    #[must_use]
    pub fn actors_or_roles(&self) -> &[String] {
        &self.actors_or_roles
    }

    /// Returns whether this chain acts as the ultimate receiver.
    #[must_use]
    pub fn is_ultimate_receiver(&self) -> bool {
        self.ultimate_receiver
    }
}

impl fmt::Debug for EndpointInvocationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointInvocationChain")
            .field("endpoint", &self.endpoint)
            .field("interceptors", &self.interceptors.len())
            .field("actors_or_roles", &self.actors_or_roles)
            .field("ultimate_receiver", &self.ultimate_receiver)
            .finish()
    }
}
