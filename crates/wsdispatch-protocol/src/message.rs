//! In-memory SOAP message.

use std::io;

use serde::{Deserialize, Serialize};
use wsdispatch_core::{
    FaultAwareMessage, HeaderElement, Payload, QName, SoapFault, WebServiceMessage,
};

use crate::SoapVersion;

/// A SOAP message held entirely in memory.
///
/// A message carries either a payload or a fault in its body; setting a
/// fault discards the payload and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoapMessage {
    /// Envelope version.
    #[serde(default)]
    pub version: SoapVersion,
    /// SOAPAction transport header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soap_action: Option<String>,
    /// Header blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderElement>,
    /// Body payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Body fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<SoapFault>,
    /// Header blocks reported back as not understood (SOAP 1.2).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_understood: Vec<QName>,
}

impl SoapMessage {
    /// Creates an empty message of the given version.
    #[must_use]
    pub fn new(version: SoapVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self.fault = None;
        self
    }

    /// Sets the SOAPAction.
    #[must_use]
    pub fn with_soap_action(mut self, action: impl Into<String>) -> Self {
        self.soap_action = Some(action.into());
        self
    }

    /// Adds a header block.
    #[must_use]
    pub fn with_header(mut self, header: HeaderElement) -> Self {
        self.headers.push(header);
        self
    }

    /// Renders the message as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl WebServiceMessage for SoapMessage {
    fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    fn set_payload(&mut self, payload: Payload) {
        self.payload = Some(payload);
        self.fault = None;
    }

    fn soap_action(&self) -> Option<&str> {
        self.soap_action.as_deref()
    }

    fn header_elements(&self) -> &[HeaderElement] {
        &self.headers
    }

    fn as_fault_aware(&self) -> Option<&dyn FaultAwareMessage> {
        Some(self)
    }

    fn as_fault_aware_mut(&mut self) -> Option<&mut dyn FaultAwareMessage> {
        Some(self)
    }

    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        serde_json::to_writer(out, self).map_err(io::Error::from)
    }
}

impl FaultAwareMessage for SoapMessage {
    fn fault(&self) -> Option<&SoapFault> {
        self.fault.as_ref()
    }

    fn set_fault(&mut self, fault: SoapFault) {
        self.payload = None;
        self.fault = Some(fault);
    }

    fn add_not_understood_header(&mut self, name: &QName) {
        if self.version == SoapVersion::Soap12 && !self.not_understood.contains(name) {
            self.not_understood.push(name.clone());
        }
    }
}
