//! Helpers for testing endpoints, interceptors and dispatch flows.
//!
//! - [`TestContext`] builds request contexts without hand-assembling messages
//! - [`CallLog`] and [`RecordingInterceptor`] record the exact order of
//!   interceptor callbacks
//!
//! ```ignore
//! use wsdispatch::testing::{CallLog, RecordingInterceptor, TestContext};
//!
//! let log = CallLog::new();
//! let mapping = FnEndpointMapping::new(move |_| Ok(Some(endpoint.clone())))
//!     .interceptor(RecordingInterceptor::new("I1", &log));
//!
//! let mut ctx = TestContext::new().with_payload("urn:test", "Echo", json!({})).build();
//! dispatcher.dispatch(&mut ctx)?;
//! assert_eq!(log.entries(), vec!["I1.handle_request", "I1.handle_response", "I1.after_completion"]);
//! ```

mod context;
mod recording;

pub use context::{TestContext, response_fault, response_payload};
pub use recording::{CallLog, Phase, RecordingInterceptor};
