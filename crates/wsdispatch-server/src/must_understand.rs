//! Mandatory SOAP header processing.
//!
//! Before any interceptor runs, every header block that is addressed to
//! this node and marked `mustUnderstand` has to be understood by at least
//! one interceptor of the chain. Otherwise the request is answered with a
//! MustUnderstand fault and neither interceptors nor the endpoint run.
//! Requests without SOAP fault support are not checked.

use serde::{Deserialize, Serialize};
use wsdispatch_core::logging::{targets, warn};
use wsdispatch_core::{MessageContext, QName, SoapFault, WsError, WsResult};

use crate::EndpointInvocationChain;

/// Fault reason used when mandatory headers are not understood.
pub const DEFAULT_MUST_UNDERSTAND_FAULT_STRING: &str =
    "One or more mandatory SOAP header blocks not understood";

/// mustUnderstand processing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MustUnderstandConfig {
    /// Whether headers are checked at all.
    pub enabled: bool,
    /// Fault reason.
    pub fault_string: String,
    /// Fault reason language.
    pub lang: Option<String>,
}

impl Default for MustUnderstandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fault_string: DEFAULT_MUST_UNDERSTAND_FAULT_STRING.to_string(),
            lang: Some("en".to_string()),
        }
    }
}

/// Returns the names of mandatory headers addressed to `chain` that none of
/// its interceptors understands.
#[must_use]
pub fn not_understood_headers(ctx: &MessageContext, chain: &EndpointInvocationChain) -> Vec<QName> {
    ctx.request()
        .header_elements()
        .iter()
        .filter(|header| header.must_understand)
        .filter(|header| header.is_targeted(chain.actors_or_roles(), chain.is_ultimate_receiver()))
        .filter(|header| {
            !chain
                .interceptors()
                .iter()
                .any(|interceptor| interceptor.understands(header))
        })
        .map(|header| header.name.clone())
        .collect()
}

/// Checks mandatory headers, writing a MustUnderstand fault on failure.
///
/// Returns `Ok(true)` if processing may continue. A response that cannot
/// carry the fault is an internal error.
pub(crate) fn process_headers(
    ctx: &mut MessageContext,
    chain: &EndpointInvocationChain,
    config: &MustUnderstandConfig,
) -> WsResult<bool> {
    if ctx.request().as_fault_aware().is_none() {
        return Ok(true);
    }
    let not_understood = not_understood_headers(ctx, chain);
    if not_understood.is_empty() {
        return Ok(true);
    }

    let names: Vec<String> = not_understood.iter().map(QName::to_string).collect();
    warn!(
        target: targets::DISPATCHER,
        "Could not handle mustUnderstand headers: {}. Returning fault",
        names.join(", ")
    );

    let mut fault = SoapFault::must_understand(config.fault_string.clone());
    if let Some(lang) = &config.lang {
        fault = fault.with_lang(lang.clone());
    }
    if let Some(actor) = chain.actors_or_roles().first() {
        fault = fault.with_actor(actor.clone());
    }

    let Some(response) = ctx.response().as_fault_aware_mut() else {
        return Err(WsError::internal(format!(
            "cannot report mustUnderstand headers {}: response does not support faults",
            names.join(", ")
        )));
    };
    response.set_fault(fault);
    for name in &not_understood {
        response.add_not_understood_header(name);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use wsdispatch_core::{
        ACTOR_NEXT, FaultCode, HeaderElement, MessageFactory, Payload, WebServiceMessage,
        WsErrorCode,
    };
    use wsdispatch_protocol::{SoapMessage, SoapMessageFactory, SoapVersion};

    use super::*;
    use crate::{Endpoint, EndpointInterceptor};

    struct Security;

    impl EndpointInterceptor for Security {
        fn understands(&self, header: &HeaderElement) -> bool {
            header.name.local_part == "Security"
        }
    }

    fn ctx(headers: Vec<HeaderElement>) -> MessageContext {
        let mut request = SoapMessage::new(SoapVersion::Soap12);
        request.headers = headers;
        SoapMessageFactory::new(SoapVersion::Soap12).create_context(request)
    }

    fn header(local: &str) -> HeaderElement {
        HeaderElement::new(QName::new("urn:h", local)).must_understand(true)
    }

    #[test]
    fn understood_headers_pass() {
        let chain = EndpointInvocationChain::new(Endpoint::custom("e", ())).interceptor(Security);
        let mut ctx = ctx(vec![header("Security")]);
        assert!(process_headers(&mut ctx, &chain, &MustUnderstandConfig::default()).unwrap());
        assert!(!ctx.has_response());
    }

    #[test]
    fn optional_and_untargeted_headers_are_ignored() {
        let chain = EndpointInvocationChain::new(Endpoint::custom("e", ()))
            .with_actors_or_roles(vec!["urn:gateway".into()]);
        let ctx = ctx(vec![
            HeaderElement::new(QName::local("Optional")),
            header("Elsewhere").with_actor_or_role("urn:elsewhere"),
        ]);
        assert!(not_understood_headers(&ctx, &chain).is_empty());
    }

    #[test]
    fn missing_understanding_writes_fault() {
        let chain = EndpointInvocationChain::new(Endpoint::custom("e", ()))
            .interceptor(Security)
            .with_actors_or_roles(vec!["urn:gateway".into()]);
        let mut ctx = ctx(vec![
            header("Security"),
            header("Transaction").with_actor_or_role(ACTOR_NEXT),
        ]);

        assert!(!process_headers(&mut ctx, &chain, &MustUnderstandConfig::default()).unwrap());

        let response = ctx.into_response().unwrap();
        let fault = response.as_fault_aware().and_then(|f| f.fault()).cloned().unwrap();
        assert_eq!(fault.code, FaultCode::MustUnderstand);
        assert_eq!(fault.reason, DEFAULT_MUST_UNDERSTAND_FAULT_STRING);
        assert_eq!(fault.actor.as_deref(), Some("urn:gateway"));

        let mut out = Vec::new();
        response.write_to(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Transaction"));
    }

    /// A message type without fault support.
    #[derive(Debug, Default)]
    struct PlainMessage {
        headers: Vec<HeaderElement>,
    }

    impl WebServiceMessage for PlainMessage {
        fn payload(&self) -> Option<&Payload> {
            None
        }

        fn set_payload(&mut self, _payload: Payload) {}

        fn header_elements(&self) -> &[HeaderElement] {
            &self.headers
        }

        fn write_to(&self, _out: &mut dyn io::Write) -> io::Result<()> {
            Ok(())
        }
    }

    fn plain_factory() -> Arc<dyn MessageFactory> {
        Arc::new(|| Box::new(PlainMessage::default()) as Box<dyn WebServiceMessage>)
    }

    #[test]
    fn requests_without_fault_support_are_not_checked() {
        let chain = EndpointInvocationChain::new(Endpoint::custom("e", ()));
        let request = PlainMessage {
            headers: vec![header("Transaction")],
        };
        let mut ctx = MessageContext::new(request, plain_factory());

        assert!(process_headers(&mut ctx, &chain, &MustUnderstandConfig::default()).unwrap());
        assert!(!ctx.has_response());
    }

    #[test]
    fn response_without_fault_support_is_an_error() {
        let chain = EndpointInvocationChain::new(Endpoint::custom("e", ()));
        let mut request = SoapMessage::new(SoapVersion::Soap11);
        request.headers = vec![header("Transaction")];
        let mut ctx = MessageContext::new(request, plain_factory());

        let err = process_headers(&mut ctx, &chain, &MustUnderstandConfig::default()).unwrap_err();
        assert_eq!(err.code, WsErrorCode::Internal);
        assert!(err.message.contains("{urn:h}Transaction"));
    }
}
