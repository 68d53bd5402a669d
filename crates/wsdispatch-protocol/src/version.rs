//! SOAP version constants.

use serde::{Deserialize, Serialize};
use wsdispatch_core::{FaultCode, QName};

/// SOAP envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1.
    #[default]
    #[serde(rename = "1.1")]
    Soap11,
    /// SOAP 1.2.
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Returns the envelope namespace URI.
    #[must_use]
    pub const fn envelope_namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
            Self::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    /// Returns the transport content type.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml",
            Self::Soap12 => "application/soap+xml",
        }
    }

    /// Returns the version-specific qualified name of a fault code.
    ///
    /// Custom codes are returned unchanged.
    #[must_use]
    pub fn fault_code_name(&self, code: &FaultCode) -> QName {
        let local = match (self, code) {
            (_, FaultCode::Custom(name)) => return name.clone(),
            (Self::Soap11, FaultCode::Receiver) => "Server",
            (Self::Soap11, FaultCode::Sender) => "Client",
            (Self::Soap12, FaultCode::Receiver) => "Receiver",
            (Self::Soap12, FaultCode::Sender) => "Sender",
            (_, FaultCode::MustUnderstand) => "MustUnderstand",
            (_, FaultCode::VersionMismatch) => "VersionMismatch",
        };
        QName::new(self.envelope_namespace(), local)
    }
}

impl std::fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soap11 => f.write_str("SOAP 1.1"),
            Self::Soap12 => f.write_str("SOAP 1.2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_code_names_follow_version() {
        assert_eq!(
            SoapVersion::Soap11.fault_code_name(&FaultCode::Receiver).local_part,
            "Server"
        );
        assert_eq!(
            SoapVersion::Soap12.fault_code_name(&FaultCode::Sender).local_part,
            "Sender"
        );
        let custom = QName::new("urn:app", "Quota");
        assert_eq!(
            SoapVersion::Soap12.fault_code_name(&FaultCode::Custom(custom.clone())),
            custom
        );
    }

    #[test]
    fn test_version_serialization() {
        let json = serde_json::to_string(&SoapVersion::Soap12).unwrap();
        assert_eq!(json, "\"1.2\"");
        assert_eq!(SoapVersion::default(), SoapVersion::Soap11);
    }
}
