//! Endpoint adapters.
//!
//! The dispatcher never invokes endpoints directly. It asks each adapter in
//! turn whether it [`supports`](EndpointAdapter::supports) the endpoint and
//! lets the first that does perform the invocation.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use wsdispatch_core::{MessageContext, WsError, WsResult};

use crate::{Endpoint, LOWEST_PRECEDENCE};

/// Invokes endpoints of the kinds it supports.
pub trait EndpointAdapter: Send + Sync {
    /// Returns whether this adapter can invoke `endpoint`. Must not have side effects.
    fn supports(&self, endpoint: &Endpoint) -> bool;

    /// Invokes the endpoint, writing any response through `ctx`.
    fn invoke(&self, ctx: &mut MessageContext, endpoint: &Endpoint) -> WsResult<()>;

    /// Sort key used when adapters are discovered from a registry.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

fn unsupported(adapter: &str, endpoint: &Endpoint) -> WsError {
    WsError::internal(format!(
        "{adapter} cannot invoke endpoint [{endpoint}] of kind {:?}",
        endpoint.kind()
    ))
}

/// Adapter for [`MessageEndpoint`](crate::MessageEndpoint)s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageEndpointAdapter;

impl EndpointAdapter for MessageEndpointAdapter {
    fn supports(&self, endpoint: &Endpoint) -> bool {
        endpoint.as_message().is_some()
    }

    fn invoke(&self, ctx: &mut MessageContext, endpoint: &Endpoint) -> WsResult<()> {
        let target = endpoint
            .as_message()
            .ok_or_else(|| unsupported("MessageEndpointAdapter", endpoint))?;
        target.invoke(ctx)
    }
}

/// Adapter for [`PayloadEndpoint`](crate::PayloadEndpoint)s.
///
/// A returned payload is written to the response; `None` leaves the
/// exchange without response.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEndpointAdapter;

impl EndpointAdapter for PayloadEndpointAdapter {
    fn supports(&self, endpoint: &Endpoint) -> bool {
        endpoint.as_payload().is_some()
    }

    fn invoke(&self, ctx: &mut MessageContext, endpoint: &Endpoint) -> WsResult<()> {
        let target = endpoint
            .as_payload()
            .ok_or_else(|| unsupported("PayloadEndpointAdapter", endpoint))?;
        if let Some(payload) = target.invoke(ctx.request().payload())? {
            ctx.response().set_payload(payload);
        }
        Ok(())
    }
}

type InvokeFn<T> = dyn Fn(&T, &mut MessageContext) -> WsResult<()> + Send + Sync;

/// Adapter for custom endpoint objects of type `T`.
///
/// Supports exactly the endpoints created with
/// [`Endpoint::custom`](crate::Endpoint::custom) around a `T`.
pub struct FnEndpointAdapter<T> {
    invoke: Box<InvokeFn<T>>,
    order: i32,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Any> FnEndpointAdapter<T> {
    /// Creates an adapter invoking `T` endpoints through `invoke`.
    pub fn new<F>(invoke: F) -> Self
    where
        F: Fn(&T, &mut MessageContext) -> WsResult<()> + Send + Sync + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            order: LOWEST_PRECEDENCE,
            _marker: PhantomData,
        }
    }

    /// Sets the discovery order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl<T: Any> EndpointAdapter for FnEndpointAdapter<T> {
    fn supports(&self, endpoint: &Endpoint) -> bool {
        endpoint.downcast_ref::<T>().is_some()
    }

    fn invoke(&self, ctx: &mut MessageContext, endpoint: &Endpoint) -> WsResult<()> {
        let target = endpoint
            .downcast_ref::<T>()
            .ok_or_else(|| unsupported(std::any::type_name::<Self>(), endpoint))?;
        (self.invoke)(target, ctx)
    }

    fn order(&self) -> i32 {
        self.order
    }
}

impl<T> fmt::Debug for FnEndpointAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEndpointAdapter")
            .field("type", &std::any::type_name::<T>())
            .field("order", &self.order)
            .finish()
    }
}
