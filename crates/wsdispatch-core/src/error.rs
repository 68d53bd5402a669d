//! Error types for wsdispatch.
//!
//! Every fallible operation in the dispatch pipeline returns [`WsResult`].
//! A [`WsError`] carries a [`WsErrorCode`] describing which stage failed,
//! a human-readable message, an optional application-level `kind` used by
//! fault-mapping exception resolvers, and an optional underlying cause.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Result alias used throughout wsdispatch.
pub type WsResult<T> = Result<T, WsError>;

/// Classification of a [`WsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WsErrorCode {
    /// No endpoint mapping produced an endpoint for the request.
    NoEndpointFound,
    /// No endpoint adapter supports the resolved endpoint.
    NoEndpointAdapter,
    /// The endpoint failed while processing the request.
    EndpointInvocation,
    /// An interceptor callback failed.
    Interceptor,
    /// A message could not be read or is structurally invalid.
    InvalidMessage,
    /// Invalid dispatcher, mapping, or resolver configuration.
    Configuration,
    /// Unexpected internal failure.
    Internal,
}

impl WsErrorCode {
    /// Returns the stable name of this code.
    ///
    /// Fault-mapping resolvers match mapping keys against this name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoEndpointFound => "NoEndpointFound",
            Self::NoEndpointAdapter => "NoEndpointAdapter",
            Self::EndpointInvocation => "EndpointInvocation",
            Self::Interceptor => "Interceptor",
            Self::InvalidMessage => "InvalidMessage",
            Self::Configuration => "Configuration",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for WsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by the dispatch pipeline, its strategies, or endpoints.
#[derive(Clone)]
pub struct WsError {
    /// Which stage or category failed.
    pub code: WsErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional application classification, e.g. `"ValidationError"`.
    pub kind: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl WsError {
    /// Creates a new error with the given code and message.
    #[must_use]
    pub fn new(code: WsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: None,
            source: None,
        }
    }

    /// Attaches an application-level classification.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the application-level classification, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// No endpoint mapping matched the given request.
    #[must_use]
    pub fn no_endpoint_found(request: impl fmt::Display) -> Self {
        Self::new(
            WsErrorCode::NoEndpointFound,
            format!("No endpoint found for request [{request}]"),
        )
    }

    /// No registered adapter supports the named endpoint.
    #[must_use]
    pub fn no_endpoint_adapter(endpoint: impl fmt::Display) -> Self {
        Self::new(
            WsErrorCode::NoEndpointAdapter,
            format!(
                "No adapter for endpoint [{endpoint}]: is it a message endpoint, a payload \
                 endpoint, or covered by a registered custom adapter?"
            ),
        )
    }

    /// The endpoint failed while handling the request.
    #[must_use]
    pub fn endpoint(message: impl Into<String>) -> Self {
        Self::new(WsErrorCode::EndpointInvocation, message)
    }

    /// An interceptor callback failed.
    #[must_use]
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::new(WsErrorCode::Interceptor, message)
    }

    /// A message is malformed or unreadable.
    #[must_use]
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::new(WsErrorCode::InvalidMessage, message)
    }

    /// The configuration is invalid.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(WsErrorCode::Configuration, message)
    }

    /// Unexpected internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(WsErrorCode::Internal, message)
    }

    /// Returns true if this is a routing failure.
    #[must_use]
    pub fn is_no_endpoint_found(&self) -> bool {
        self.code == WsErrorCode::NoEndpointFound
    }
}

impl fmt::Debug for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "[{}/{}] {}", self.code, kind, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for WsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_message(err.to_string()).with_source(err)
    }
}

impl From<std::io::Error> for WsError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_includes_code_and_kind() {
        let err = WsError::endpoint("boom");
        assert_eq!(err.to_string(), "[EndpointInvocation] boom");

        let err = err.with_kind("ValidationError");
        assert_eq!(err.to_string(), "[EndpointInvocation/ValidationError] boom");
        assert_eq!(err.kind(), Some("ValidationError"));
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("disk on fire");
        let err = WsError::from(io);
        assert_eq!(err.code, WsErrorCode::Internal);
        assert!(err.source().is_some());
        assert!(WsError::internal("plain").source().is_none());
    }

    #[test]
    fn json_errors_are_invalid_messages() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = WsError::from(parse);
        assert_eq!(err.code, WsErrorCode::InvalidMessage);
    }

    #[test]
    fn no_endpoint_found_is_recognized() {
        let err = WsError::no_endpoint_found("{urn:x}Echo");
        assert!(err.is_no_endpoint_found());
        assert!(err.message.contains("{urn:x}Echo"));
        assert!(!WsError::endpoint("x").is_no_endpoint_found());
    }

    #[test]
    fn code_names_are_stable() {
        assert_eq!(WsErrorCode::NoEndpointAdapter.as_str(), "NoEndpointAdapter");
        assert_eq!(WsErrorCode::Configuration.to_string(), "Configuration");
    }
}
