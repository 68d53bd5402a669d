//! Example: Echo Endpoint
//!
//! Dispatches one SOAP message read as JSON from stdin and prints the
//! response.
//!
//! Run with:
//! ```bash
//! echo '{"version":"1.1","payload":{"name":{"namespace_uri":"urn:echo","local_part":"Echo"},"body":"hi"}}' \
//!   | WSDISPATCH_LOG=debug cargo run --example echo_endpoint
//! ```
//!
//! With no input a built-in request is used.

use std::io::{self, Read, Write};

use serde_json::json;
use wsdispatch::prelude::*;

const NS: &str = "urn:echo";

// ============================================================================
// Endpoints
// ============================================================================

/// Echoes the request payload under an `EchoResponse` root.
struct Echo;

impl PayloadEndpoint for Echo {
    fn invoke(&self, request: Option<&Payload>) -> WsResult<Option<Payload>> {
        let body = request.map(|payload| payload.body.clone()).unwrap_or_default();
        Ok(Some(Payload::new(QName::new(NS, "EchoResponse"), body)))
    }
}

/// Reverses a string payload; anything else is a client error.
fn reverse(request: Option<&Payload>) -> WsResult<Option<Payload>> {
    let text = request
        .and_then(|payload| payload.body.as_str())
        .ok_or_else(|| WsError::endpoint("Reverse expects a string").with_kind("BadInput"))?;
    Ok(Some(Payload::new(
        QName::new(NS, "ReverseResponse"),
        json!(text.chars().rev().collect::<String>()),
    )))
}

// ============================================================================
// Main
// ============================================================================

fn main() -> WsResult<()> {
    LoggingConfig::from_env().init();

    let mapping = PayloadRootQNameEndpointMapping::new()
        .with_endpoint(QName::new(NS, "Echo"), Endpoint::payload("echo", Echo))?
        .with_endpoint(QName::new(NS, "Reverse"), Endpoint::payload_fn("reverse", reverse))?
        .interceptor(PayloadLoggingInterceptor::new());

    let resolver = SoapFaultMappingExceptionResolver::new()
        .mapping_str("BadInput", "CLIENT,,en")?
        .default_fault(SoapFaultDefinition::receiver("Internal error"));

    let dispatcher = MessageDispatcher::builder()
        .name("echo")
        .mapping(mapping)
        .resolver(resolver)
        .build();

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    let factory = SoapMessageFactory::default();
    let request = if input.iter().all(u8::is_ascii_whitespace) {
        factory.create_request(Payload::new(QName::new(NS, "Reverse"), json!("dispatch")))
    } else {
        factory.read_message(&input)?
    };

    let mut ctx = factory.create_context(request);
    dispatcher.receive(&mut ctx)?;

    let mut stdout = io::stdout().lock();
    match ctx.response_if_present() {
        Some(response) => response.write_to(&mut stdout)?,
        None => write!(stdout, "(no response)")?,
    }
    writeln!(stdout)?;
    Ok(())
}
