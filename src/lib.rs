//! Fault injection for request handlers.
//!
//! This crate wraps an existing request handler so that a caller-supplied
//! policy can force failure statuses, letting clients of a service exercise
//! their retry and backoff logic against a controlled failure rate without
//! touching the real handler.
//!
//! A policy is consulted at two points per request:
//! - **Pre-dispatch**: before the wrapped handler runs. A failure here ends
//!   the request with that status and an empty body.
//! - **Pre-commit**: the first time the wrapped handler commits a status,
//!   either explicitly or by writing body bytes. A failure here replaces the
//!   status; the handler's body is still written.
//!
//! # Core Types
//!
//! - [`FaultInjector`]: The wrapping handler
//! - [`ResponseGuard`]: The response decorator that runs the pre-commit decision
//! - [`DecisionPolicy`]: Decides whether a request fails at a given [`Phase`]
//! - [`ResponseSink`]: The response-writing surface handlers write to
//! - [`RecordingSink`]: In-memory sink for tests and examples
//!
//! # Fatal faults
//!
//! A policy must return `0` or a status in `400..=599`. Anything else is a
//! bug in the policy; the request is aborted with a panic carrying an
//! [`InvalidDecision`] payload instead of producing a response.
//!
//! # Examples
//!
//! ```
//! use resilience_core::{
//!     AlwaysFail, FaultInjector, Handler, Phase, PhaseScoped, RecordingSink, ResponseSink,
//! };
//! use http::{Request, StatusCode};
//!
//! let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
//!     let _ = w.write_bytes(b"hello");
//! };
//! let policy = PhaseScoped::new(AlwaysFail::new(503).expect("valid status"), Phase::PreDispatch);
//! let injector = FaultInjector::new(handler, policy);
//!
//! let request = Request::get("/").body(()).unwrap();
//! let mut sink = RecordingSink::new();
//! injector.handle(&request, &mut sink);
//!
//! assert_eq!(sink.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
//! assert!(sink.body().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod decision;
mod error;
mod guard;
mod handler;
mod phase;
mod policy;
mod sink;

pub use decision::{Decision, MAX_FAILURE_STATUS, MIN_FAILURE_STATUS};
pub use error::{ConfigError, ConfigErrorKind, Error, InvalidDecision};
pub use guard::ResponseGuard;
pub use handler::{FaultInjector, Handler};
pub use phase::Phase;
pub use policy::{AlwaysFail, DecisionPolicy, NeverFail, PhaseScoped, RandomFailure};
pub use sink::{RecordingSink, ResponseSink, SinkError, SinkErrorKind};
