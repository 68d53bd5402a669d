//! Callback recording for interceptor tests.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wsdispatch_core::{HeaderElement, MessageContext, QName, WsError, WsResult};
use wsdispatch_server::{Endpoint, EndpointInterceptor};

/// Shared, ordered record of calls. Clones append to the same record.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// Returns a snapshot of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Returns whether an entry equal to `entry` was recorded.
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.lock().iter().any(|e| e == entry)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl fmt::Debug for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

/// Interceptor callback phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `handle_request`
    Request,
    /// `handle_response`
    Response,
    /// `handle_fault`
    Fault,
    /// `after_completion`
    Completion,
}

impl Phase {
    /// Callback name, as used in log entries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "handle_request",
            Self::Response => "handle_response",
            Self::Fault => "handle_fault",
            Self::Completion => "after_completion",
        }
    }
}

/// Interceptor that records every callback into a [`CallLog`].
///
/// Entries have the form `{name}.{callback}`, e.g. `I1.handle_request`.
/// Completion entries carry the error code they observed when there was
/// one: `I1.after_completion(EndpointInvocation)`.
#[derive(Debug)]
pub struct RecordingInterceptor {
    name: String,
    log: CallLog,
    stop: Vec<Phase>,
    fail: Vec<Phase>,
    understood: Vec<QName>,
}

impl RecordingInterceptor {
    /// Creates an interceptor that passes every callback through.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            stop: Vec::new(),
            fail: Vec::new(),
            understood: Vec::new(),
        }
    }

    /// Returns `false` from the given phase. Ignored for [`Phase::Completion`].
    #[must_use]
    pub fn stop_on(mut self, phase: Phase) -> Self {
        self.stop.push(phase);
        self
    }

    /// Fails the given phase with an interceptor error.
    #[must_use]
    pub fn fail_on(mut self, phase: Phase) -> Self {
        self.fail.push(phase);
        self
    }

    /// Declares a mandatory header as understood.
    #[must_use]
    pub fn understanding(mut self, name: QName) -> Self {
        self.understood.push(name);
        self
    }

    /// Returns the interceptor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn record(&self, phase: Phase) -> WsResult<bool> {
        self.log.push(format!("{}.{}", self.name, phase.as_str()));
        self.outcome(phase)
    }

    fn outcome(&self, phase: Phase) -> WsResult<bool> {
        if self.fail.contains(&phase) {
            return Err(WsError::interceptor(format!(
                "{} failed in {}",
                self.name,
                phase.as_str()
            )));
        }
        Ok(!self.stop.contains(&phase))
    }
}

impl EndpointInterceptor for RecordingInterceptor {
    fn handle_request(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        self.record(Phase::Request)
    }

    fn handle_response(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        self.record(Phase::Response)
    }

    fn handle_fault(&self, _ctx: &mut MessageContext, _endpoint: &Endpoint) -> WsResult<bool> {
        self.record(Phase::Fault)
    }

    fn after_completion(
        &self,
        _ctx: &mut MessageContext,
        _endpoint: &Endpoint,
        error: Option<&WsError>,
    ) -> WsResult<()> {
        let entry = match error {
            Some(err) => format!("{}.{}({})", self.name, Phase::Completion.as_str(), err.code),
            None => format!("{}.{}", self.name, Phase::Completion.as_str()),
        };
        self.log.push(entry);
        self.outcome(Phase::Completion).map(|_| ())
    }

    fn understands(&self, header: &HeaderElement) -> bool {
        self.understood.contains(&header.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[test]
    fn test_call_log_is_shared_between_clones() {
        let log = CallLog::new();
        let other = log.clone();
        other.push("a");
        log.push("b");
        assert_eq!(log.entries(), vec!["a", "b"]);
        assert!(other.contains("b"));
        assert_eq!(other.len(), 2);

        log.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn test_recording_interceptor_outcomes() {
        let log = CallLog::new();
        let interceptor = RecordingInterceptor::new("I1", &log)
            .stop_on(Phase::Request)
            .fail_on(Phase::Fault);
        let endpoint = Endpoint::custom("e", ());
        let mut ctx = TestContext::new().build();

        assert!(!interceptor.handle_request(&mut ctx, &endpoint).unwrap());
        assert!(interceptor.handle_response(&mut ctx, &endpoint).unwrap());
        assert!(interceptor.handle_fault(&mut ctx, &endpoint).is_err());
        let err = WsError::endpoint("boom");
        interceptor.after_completion(&mut ctx, &endpoint, Some(&err)).unwrap();

        assert_eq!(
            log.entries(),
            vec![
                "I1.handle_request",
                "I1.handle_response",
                "I1.handle_fault",
                "I1.after_completion(EndpointInvocation)",
            ]
        );
    }

    #[test]
    fn test_understanding() {
        let log = CallLog::new();
        let name = QName::new("urn:sec", "Token");
        let interceptor = RecordingInterceptor::new("sec", &log).understanding(name.clone());
        assert!(interceptor.understands(&HeaderElement::new(name)));
        assert!(!interceptor.understands(&HeaderElement::new(QName::local("Other"))));
        assert_eq!(interceptor.name(), "sec");
    }
}
