//! Message contracts consumed by the dispatch pipeline.
//!
//! The dispatcher never depends on a concrete XML or SOAP object model.
//! It sees messages through [`WebServiceMessage`], optionally through the
//! [`FaultAwareMessage`] view, and creates responses through a
//! [`MessageFactory`].

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WsError;

/// SOAP 1.1 actor URI addressing the next node on the message path.
pub const ACTOR_NEXT: &str = "http://schemas.xmlsoap.org/soap/actor/next";

/// SOAP 1.2 role URI addressing the next node on the message path.
pub const ROLE_NEXT: &str = "http://www.w3.org/2003/05/soap-envelope/role/next";

/// SOAP 1.2 role URI that no node may assume.
pub const ROLE_NONE: &str = "http://www.w3.org/2003/05/soap-envelope/role/none";

/// SOAP 1.2 role URI of the ultimate receiver.
pub const ROLE_ULTIMATE_RECEIVER: &str =
    "http://www.w3.org/2003/05/soap-envelope/role/ultimateReceiver";

// ============================================================================
// QName
// ============================================================================

/// A namespace-qualified name.
///
/// Rendered and parsed in `{namespace}local` notation; a name without a
/// namespace renders as just the local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI, empty when unqualified.
    pub namespace_uri: String,
    /// Local part.
    pub local_part: String,
}

impl QName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace_uri: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_part: local_part.into(),
        }
    }

    /// Creates a name without namespace.
    #[must_use]
    pub fn local(local_part: impl Into<String>) -> Self {
        Self::new(String::new(), local_part)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            f.write_str(&self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_part)
        }
    }
}

impl FromStr for QName {
    type Err = WsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WsError::invalid_message("empty qualified name"));
        }
        let Some(rest) = s.strip_prefix('{') else {
            return Ok(Self::local(s));
        };
        let Some((namespace, local)) = rest.split_once('}') else {
            return Err(WsError::invalid_message(format!(
                "qualified name [{s}] has an unterminated namespace"
            )));
        };
        if local.is_empty() {
            return Err(WsError::invalid_message(format!(
                "qualified name [{s}] has no local part"
            )));
        }
        Ok(Self::new(namespace, local))
    }
}

// ============================================================================
// Payload and headers
// ============================================================================

/// The body content of a message.
///
/// The dispatcher treats payloads as opaque; `name` is the payload root
/// element name used for routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Root element name.
    pub name: QName,
    /// Structured content.
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Payload {
    /// Creates a payload.
    #[must_use]
    pub fn new(name: QName, body: serde_json::Value) -> Self {
        Self { name, body }
    }

    /// Returns the root element name.
    #[must_use]
    pub fn name(&self) -> &QName {
        &self.name
    }
}

/// A SOAP header block as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderElement {
    /// Header block name.
    pub name: QName,
    /// Whether the receiver must process this block.
    #[serde(default)]
    pub must_understand: bool,
    /// SOAP 1.1 actor or SOAP 1.2 role this block is addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_or_role: Option<String>,
}

impl HeaderElement {
    /// Creates an optional header block without actor.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            must_understand: false,
            actor_or_role: None,
        }
    }

    /// Marks the block as mandatory.
    #[must_use]
    pub fn must_understand(mut self, must_understand: bool) -> Self {
        self.must_understand = must_understand;
        self
    }

    /// Addresses the block to an actor or role.
    #[must_use]
    pub fn with_actor_or_role(mut self, actor_or_role: impl Into<String>) -> Self {
        self.actor_or_role = Some(actor_or_role.into());
        self
    }

    /// Returns whether this block is addressed to a node acting in
    /// `actors_or_roles`.
    ///
    /// Blocks without an actor (or addressed to the ultimate receiver) only
    /// target the ultimate receiver; "next" always targets; "none" never does.
    #[must_use]
    pub fn is_targeted(&self, actors_or_roles: &[String], ultimate_receiver: bool) -> bool {
        match self.actor_or_role.as_deref() {
            None | Some("") | Some(ROLE_ULTIMATE_RECEIVER) => ultimate_receiver,
            Some(ACTOR_NEXT | ROLE_NEXT) => true,
            Some(ROLE_NONE) => false,
            Some(actor) => actors_or_roles.iter().any(|a| a == actor),
        }
    }
}

// ============================================================================
// Faults
// ============================================================================

/// SOAP fault code, version-neutral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultCode {
    /// The receiver failed (SOAP 1.1 `Server`).
    Receiver,
    /// The sender sent a bad message (SOAP 1.1 `Client`).
    Sender,
    /// A mandatory header block was not understood.
    MustUnderstand,
    /// The envelope version is not supported.
    VersionMismatch,
    /// An application-defined fault code.
    Custom(QName),
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver => f.write_str("Receiver"),
            Self::Sender => f.write_str("Sender"),
            Self::MustUnderstand => f.write_str("MustUnderstand"),
            Self::VersionMismatch => f.write_str("VersionMismatch"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// A SOAP fault carried by a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapFault {
    /// Fault code.
    pub code: FaultCode,
    /// Fault string (SOAP 1.1) or reason text (SOAP 1.2).
    pub reason: String,
    /// Language of `reason`, e.g. `"en"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Fault actor (SOAP 1.1) or role (SOAP 1.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Application-specific detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl SoapFault {
    /// Creates a fault with the given code and reason.
    #[must_use]
    pub fn new(code: FaultCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            lang: None,
            actor: None,
            detail: None,
        }
    }

    /// A receiver (server) fault.
    #[must_use]
    pub fn receiver(reason: impl Into<String>) -> Self {
        Self::new(FaultCode::Receiver, reason)
    }

    /// A sender (client) fault.
    #[must_use]
    pub fn sender(reason: impl Into<String>) -> Self {
        Self::new(FaultCode::Sender, reason)
    }

    /// A mustUnderstand fault.
    #[must_use]
    pub fn must_understand(reason: impl Into<String>) -> Self {
        Self::new(FaultCode::MustUnderstand, reason)
    }

    /// Sets the reason language.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Sets the fault actor or role.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the fault detail.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

// ============================================================================
// Message traits
// ============================================================================

/// A message flowing through the dispatcher.
pub trait WebServiceMessage: fmt::Debug + Send + Sync {
    /// Returns the payload, if the message has one.
    fn payload(&self) -> Option<&Payload>;

    /// Replaces the payload.
    fn set_payload(&mut self, payload: Payload);

    /// Returns the payload root element name.
    fn payload_root(&self) -> Option<&QName> {
        self.payload().map(Payload::name)
    }

    /// Returns the SOAPAction associated with this message.
    fn soap_action(&self) -> Option<&str> {
        None
    }

    /// Returns the header blocks of this message.
    fn header_elements(&self) -> &[HeaderElement] {
        &[]
    }

    /// Returns the fault-aware view, if this message supports faults.
    fn as_fault_aware(&self) -> Option<&dyn FaultAwareMessage> {
        None
    }

    /// Returns the mutable fault-aware view, if this message supports faults.
    fn as_fault_aware_mut(&mut self) -> Option<&mut dyn FaultAwareMessage> {
        None
    }

    /// Writes a textual rendering of the message, used by message tracing.
    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

/// Fault capability of a message.
pub trait FaultAwareMessage {
    /// Returns whether the message carries a fault.
    fn has_fault(&self) -> bool {
        self.fault().is_some()
    }

    /// Returns the fault, if any.
    fn fault(&self) -> Option<&SoapFault>;

    /// Replaces the message body with the given fault.
    fn set_fault(&mut self, fault: SoapFault);

    /// Records a header block that was not understood (SOAP 1.2 `NotUnderstood`).
    fn add_not_understood_header(&mut self, _name: &QName) {}
}

/// Creates response messages on demand.
pub trait MessageFactory: Send + Sync {
    /// Creates a new, empty message.
    fn create_message(&self) -> Box<dyn WebServiceMessage>;
}

impl<F> MessageFactory for F
where
    F: Fn() -> Box<dyn WebServiceMessage> + Send + Sync,
{
    fn create_message(&self) -> Box<dyn WebServiceMessage> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_display_and_parse() {
        let name = QName::new("urn:orders", "PlaceOrder");
        assert_eq!(name.to_string(), "{urn:orders}PlaceOrder");
        assert_eq!("{urn:orders}PlaceOrder".parse::<QName>().unwrap(), name);

        let local: QName = "Ping".parse().unwrap();
        assert_eq!(local, QName::local("Ping"));
        assert_eq!(local.to_string(), "Ping");
    }

    #[test]
    fn qname_rejects_malformed_input() {
        assert!("".parse::<QName>().is_err());
        assert!("{urn:x".parse::<QName>().is_err());
        assert!("{urn:x}".parse::<QName>().is_err());
    }

    #[test]
    fn header_targeting_rules() {
        let name = QName::new("urn:sec", "Security");
        let roles = vec!["urn:gateway".to_string()];

        let untargeted = HeaderElement::new(name.clone());
        assert!(untargeted.is_targeted(&roles, true));
        assert!(!untargeted.is_targeted(&roles, false));

        let next = HeaderElement::new(name.clone()).with_actor_or_role(ACTOR_NEXT);
        assert!(next.is_targeted(&[], false));
        let next12 = HeaderElement::new(name.clone()).with_actor_or_role(ROLE_NEXT);
        assert!(next12.is_targeted(&[], false));

        let none = HeaderElement::new(name.clone()).with_actor_or_role(ROLE_NONE);
        assert!(!none.is_targeted(&roles, true));

        let gateway = HeaderElement::new(name.clone()).with_actor_or_role("urn:gateway");
        assert!(gateway.is_targeted(&roles, false));
        let other = HeaderElement::new(name).with_actor_or_role("urn:elsewhere");
        assert!(!other.is_targeted(&roles, true));
    }

    #[test]
    fn fault_builders() {
        let fault = SoapFault::receiver("boom")
            .with_lang("en")
            .with_actor("urn:me");
        assert_eq!(fault.code, FaultCode::Receiver);
        assert_eq!(fault.reason, "boom");
        assert_eq!(fault.lang.as_deref(), Some("en"));
        assert_eq!(fault.actor.as_deref(), Some("urn:me"));
        assert_eq!(
            FaultCode::Custom(QName::new("urn:app", "Quota")).to_string(),
            "{urn:app}Quota"
        );
    }
}
