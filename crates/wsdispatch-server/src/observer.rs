//! Dispatch lifecycle observers.
//!
//! The dispatcher reports what happens to each exchange through a
//! [`DispatchObserver`]. [`MessageTracingObserver`] is the default and logs
//! received and sent messages under the message tracing targets.

use wsdispatch_core::logging::{debug, is_enabled, targets, trace, Level};
use wsdispatch_core::{MessageContext, WebServiceMessage, WsError};

use crate::Endpoint;

/// Receives dispatch lifecycle notifications. All methods default to no-ops.
pub trait DispatchObserver: Send + Sync {
    /// A request entered [`receive`](crate::MessageDispatcher::receive).
    fn request_received(&self, _ctx: &MessageContext) {}

    /// Dispatch completed with a response.
    ///
    /// `request` holds the request as it was received, before interceptors
    /// could change it.
    fn response_sent(&self, _ctx: &MessageContext, _request: &ReceivedRequest) {}

    /// Dispatch completed without a response.
    fn no_response(&self, _ctx: &MessageContext, _request: &ReceivedRequest) {}

    /// No mapping produced an endpoint for the request.
    fn endpoint_not_found(&self, _ctx: &MessageContext) {}

    /// A resolver handled an endpoint error.
    fn exception_resolved(&self, _ctx: &MessageContext, _endpoint: &Endpoint, _error: &WsError) {}
}

/// Request contents captured when a request enters
/// [`receive`](crate::MessageDispatcher::receive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    summary: String,
    rendered: Option<String>,
}

impl ReceivedRequest {
    /// Captures `message`. The full rendering is kept only when
    /// `render_contents` is set.
    #[must_use]
    pub fn capture(message: &dyn WebServiceMessage, render_contents: bool) -> Self {
        Self {
            summary: describe(message),
            rendered: render_contents.then(|| render(message)),
        }
    }

    /// Short description, see [`describe`].
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Full rendering, see [`render`].
    #[must_use]
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Logs received requests and sent responses.
///
/// Full message contents are rendered only when TRACE is enabled for the
/// tracing target; otherwise a DEBUG line names the payload root.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageTracingObserver;

impl DispatchObserver for MessageTracingObserver {
    fn request_received(&self, ctx: &MessageContext) {
        if is_enabled(Level::Trace, targets::TRACING_RECEIVED) {
            trace!(target: targets::TRACING_RECEIVED, "Received request [{}]", render(ctx.request()));
        } else {
            debug!(target: targets::TRACING_RECEIVED, "Received request [{}]", describe(ctx.request()));
        }
    }

    fn response_sent(&self, ctx: &MessageContext, request: &ReceivedRequest) {
        let Some(response) = ctx.response_if_present() else {
            return;
        };
        match request.rendered() {
            Some(rendered) if is_enabled(Level::Trace, targets::TRACING_SENT) => trace!(
                target: targets::TRACING_SENT,
                "Sent response [{}] for request [{}]",
                render(response),
                rendered
            ),
            _ => debug!(
                target: targets::TRACING_SENT,
                "Sent response [{}] for request [{}]",
                describe(response),
                request.summary()
            ),
        }
    }

    fn no_response(&self, _ctx: &MessageContext, request: &ReceivedRequest) {
        debug!(
            target: targets::TRACING_SENT,
            "Sent no response for request [{}]",
            request.summary()
        );
    }
}

/// Renders a message through [`WebServiceMessage::write_to`].
#[must_use]
pub fn render(message: &dyn WebServiceMessage) -> String {
    let mut buf = Vec::new();
    match message.write_to(&mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(err) => format!("<unrenderable message: {err}>"),
    }
}

/// Short description of a message: its fault, payload root, or `<empty>`.
#[must_use]
pub fn describe(message: &dyn WebServiceMessage) -> String {
    if let Some(fault) = message.as_fault_aware().and_then(|f| f.fault()) {
        return format!("Fault {}: {}", fault.code, fault.reason);
    }
    match message.payload_root() {
        Some(root) => root.to_string(),
        None => "<empty>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wsdispatch_core::{FaultAwareMessage, Payload, QName, SoapFault};
    use wsdispatch_protocol::SoapMessage;

    use super::*;

    #[test]
    fn describe_prefers_fault() {
        let mut msg = SoapMessage::default()
            .with_payload(Payload::new(QName::new("urn:t", "Echo"), json!(1)));
        assert_eq!(describe(&msg), "{urn:t}Echo");

        msg.set_fault(SoapFault::sender("bad input"));
        assert_eq!(describe(&msg), "Fault Sender: bad input");
        assert_eq!(describe(&SoapMessage::default()), "<empty>");
    }

    #[test]
    fn received_request_renders_on_demand() {
        let msg = SoapMessage::default()
            .with_payload(Payload::new(QName::new("urn:t", "Echo"), json!(1)));

        let brief = ReceivedRequest::capture(&msg, false);
        assert_eq!(brief.summary(), "{urn:t}Echo");
        assert!(brief.rendered().is_none());

        let full = ReceivedRequest::capture(&msg, true);
        assert_eq!(full.rendered(), Some(render(&msg).as_str()));
    }

    #[test]
    fn render_uses_write_to() {
        let msg = SoapMessage::default().with_soap_action("urn:a");
        assert!(render(&msg).contains("urn:a"));
    }
}
