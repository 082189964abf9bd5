//! Request handlers and the fault-injecting wrapper.

use crate::decision::enforce;
use crate::guard::ResponseGuard;
use crate::phase::Phase;
use crate::policy::DecisionPolicy;
use crate::sink::ResponseSink;

/// Something that serves a request by writing to a response sink.
///
/// Any `Fn(&Req, &mut dyn ResponseSink)` closure is a handler.
pub trait Handler<Req: ?Sized> {
    /// Serves one request.
    fn handle(&self, request: &Req, response: &mut dyn ResponseSink);
}

impl<Req: ?Sized, F> Handler<Req> for F
where
    F: Fn(&Req, &mut dyn ResponseSink),
{
    fn handle(&self, request: &Req, response: &mut dyn ResponseSink) {
        (self)(request, response)
    }
}

/// Wraps a handler so a policy can force failure statuses.
///
/// For each request the injector:
///
/// 1. Asks the policy for a [`Phase::PreDispatch`] decision. A failure status
///    is committed on the real sink and the request ends there; the wrapped
///    handler is never called and no body is written.
/// 2. Otherwise calls the wrapped handler with a [`ResponseGuard`] in place of
///    the real sink, which asks for a [`Phase::PreCommit`] decision when the
///    handler first commits a status or writes its body.
///
/// A policy value other than `0` or `400..=599` at either point panics with an
/// [`InvalidDecision`](crate::InvalidDecision) payload. Panics raised by the
/// wrapped handler propagate untouched.
///
/// `FaultInjector` is itself a [`Handler`], so it can be nested or handed to
/// anything that accepts one.
///
/// # Examples
///
/// ```
/// use resilience_core::{FaultInjector, Handler, Phase, RecordingSink, ResponseSink};
/// use http::{Request, StatusCode};
///
/// let injector = FaultInjector::new(
///     |_req: &Request<()>, w: &mut dyn ResponseSink| {
///         let _ = w.write_bytes(b"hello");
///     },
///     |_req: &Request<()>, phase: Phase| if phase == Phase::PreCommit { 500 } else { 0 },
/// );
///
/// let request = Request::get("/foo").body(()).unwrap();
/// let mut sink = RecordingSink::new();
/// injector.handle(&request, &mut sink);
///
/// assert_eq!(sink.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
/// assert_eq!(sink.body(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct FaultInjector<H, P> {
    handler: H,
    policy: P,
}

impl<H, P> FaultInjector<H, P> {
    /// Wraps `handler`, consulting `policy` on every request.
    pub fn new(handler: H, policy: P) -> Self {
        Self { handler, policy }
    }

    /// Returns the wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Unwraps the injector into its handler and policy.
    pub fn into_parts(self) -> (H, P) {
        (self.handler, self.policy)
    }
}

impl<Req, H, P> Handler<Req> for FaultInjector<H, P>
where
    Req: ?Sized,
    H: Handler<Req>,
    P: DecisionPolicy<Req>,
{
    fn handle(&self, request: &Req, response: &mut dyn ResponseSink) {
        let phase = Phase::PreDispatch;
        if let Some(status) = enforce(self.policy.decide(request, phase), phase) {
            tracing::warn!(phase = %phase, status = status.as_u16(), "injecting failure");
            response.commit_status(status);
            return;
        }

        tracing::debug!("dispatching to wrapped handler");
        let mut guard = ResponseGuard::new(response, request, &self.policy);
        self.handler.handle(request, &mut guard);
    }
}
