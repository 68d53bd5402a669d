//! SOAP message factory.

use std::sync::Arc;

use wsdispatch_core::{
    MessageContext, MessageFactory, Payload, WebServiceMessage, WsError, WsResult,
};

use crate::{SoapMessage, SoapVersion};

/// Creates [`SoapMessage`]s of a fixed version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoapMessageFactory {
    version: SoapVersion,
}

impl SoapMessageFactory {
    /// Creates a factory for the given version.
    #[must_use]
    pub const fn new(version: SoapVersion) -> Self {
        Self { version }
    }

    /// Returns the version of messages created by this factory.
    #[must_use]
    pub const fn version(&self) -> SoapVersion {
        self.version
    }

    /// Creates a request carrying the given payload.
    #[must_use]
    pub fn create_request(&self, payload: Payload) -> SoapMessage {
        SoapMessage::new(self.version).with_payload(payload)
    }

    /// Reads a request from its JSON rendering.
    ///
    /// A message declaring a different envelope version is rejected with an
    /// `InvalidMessage` error of kind `VersionMismatch`.
    pub fn read_message(&self, bytes: &[u8]) -> WsResult<SoapMessage> {
        let message: SoapMessage = serde_json::from_slice(bytes)?;
        if message.version != self.version {
            return Err(WsError::invalid_message(format!(
                "expected a {} message, got {}",
                self.version, message.version
            ))
            .with_kind("VersionMismatch"));
        }
        Ok(message)
    }

    /// Wraps a request in a [`MessageContext`] whose responses come from
    /// this factory.
    #[must_use]
    pub fn create_context(&self, request: SoapMessage) -> MessageContext {
        MessageContext::new(request, Arc::new(*self))
    }
}

impl MessageFactory for SoapMessageFactory {
    fn create_message(&self) -> Box<dyn WebServiceMessage> {
        Box::new(SoapMessage::new(self.version))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wsdispatch_core::{QName, WsErrorCode};

    use super::*;

    #[test]
    fn test_read_message() {
        let factory = SoapMessageFactory::new(SoapVersion::Soap12);
        let raw = br#"{
            "version": "1.2",
            "soap_action": "urn:echo",
            "payload": {"name": {"namespace_uri": "urn:t", "local_part": "Echo"}, "body": "hi"}
        }"#;
        let msg = factory.read_message(raw).unwrap();
        assert_eq!(msg.soap_action.as_deref(), Some("urn:echo"));
        assert_eq!(msg.payload_root(), Some(&QName::new("urn:t", "Echo")));
    }

    #[test]
    fn test_read_message_rejects_other_version() {
        let factory = SoapMessageFactory::new(SoapVersion::Soap12);
        let err = factory.read_message(br#"{"version": "1.1"}"#).unwrap_err();
        assert_eq!(err.code, WsErrorCode::InvalidMessage);
        assert_eq!(err.kind(), Some("VersionMismatch"));
    }

    #[test]
    fn test_read_message_rejects_garbage() {
        let err = SoapMessageFactory::default().read_message(b"<Envelope/>").unwrap_err();
        assert_eq!(err.code, WsErrorCode::InvalidMessage);
    }

    #[test]
    fn test_context_creates_responses_of_same_version() {
        let factory = SoapMessageFactory::new(SoapVersion::Soap12);
        let request = factory.create_request(Payload::new(QName::local("Ping"), json!(null)));
        let mut ctx = factory.create_context(request);
        assert!(!ctx.has_response());

        let response = ctx.response();
        let mut out = Vec::new();
        response.write_to(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\"1.2\""));
    }
}
