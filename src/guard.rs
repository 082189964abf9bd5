//! The response decorator that runs the pre-commit decision.

use http::StatusCode;

use crate::decision::enforce;
use crate::phase::Phase;
use crate::policy::DecisionPolicy;
use crate::sink::{ResponseSink, SinkError};

/// A [`ResponseSink`] wrapper that consults the policy when the status is
/// first committed.
///
/// The guard owns the commit state for one request. The first call to
/// [`commit_status`](ResponseSink::commit_status), or the first
/// [`write_bytes`](ResponseSink::write_bytes) if it comes first, asks the
/// policy for a [`Phase::PreCommit`] decision and commits either the forced
/// status or the caller's. After that the status is frozen: later commits are
/// ignored and writes go straight through.
///
/// # Examples
///
/// ```
/// use resilience_core::{Phase, RecordingSink, ResponseGuard, ResponseSink};
/// use http::StatusCode;
///
/// let policy = |_req: &(), phase: Phase| if phase == Phase::PreCommit { 500 } else { 0 };
/// let mut sink = RecordingSink::new();
/// {
///     let mut guard = ResponseGuard::new(&mut sink, &(), &policy);
///     guard.write_bytes(b"hello").unwrap();
///     assert_eq!(guard.committed_status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
/// }
/// assert_eq!(sink.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
/// assert_eq!(sink.body(), b"hello");
/// ```
pub struct ResponseGuard<'a, Req: ?Sized, P: ?Sized, S: ?Sized> {
    sink: &'a mut S,
    request: &'a Req,
    policy: &'a P,
    committed: Option<StatusCode>,
}

impl<'a, Req, P, S> ResponseGuard<'a, Req, P, S>
where
    Req: ?Sized,
    P: DecisionPolicy<Req> + ?Sized,
    S: ResponseSink + ?Sized,
{
    /// Wraps `sink` for one request.
    pub fn new(sink: &'a mut S, request: &'a Req, policy: &'a P) -> Self {
        Self {
            sink,
            request,
            policy,
            committed: None,
        }
    }

    /// Returns `true` once a status has been committed through this guard.
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Returns the status actually committed, after any override.
    pub fn committed_status(&self) -> Option<StatusCode> {
        self.committed
    }

    /// The single commit gate shared by the explicit and implicit paths.
    fn commit(&mut self, requested: StatusCode) {
        if self.committed.is_some() {
            return;
        }
        let phase = Phase::PreCommit;
        let status = match enforce(self.policy.decide(self.request, phase), phase) {
            Some(forced) => {
                tracing::warn!(
                    phase = %phase,
                    status = forced.as_u16(),
                    requested = requested.as_u16(),
                    "injecting failure"
                );
                forced
            }
            None => {
                tracing::debug!(status = requested.as_u16(), "committing handler status");
                requested
            }
        };
        self.sink.commit_status(status);
        self.committed = Some(status);
    }
}

impl<Req, P, S> ResponseSink for ResponseGuard<'_, Req, P, S>
where
    Req: ?Sized,
    P: DecisionPolicy<Req> + ?Sized,
    S: ResponseSink + ?Sized,
{
    fn commit_status(&mut self, status: StatusCode) {
        self.commit(status);
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        if self.committed.is_none() {
            self.commit(StatusCode::OK);
        }
        self.sink.write_bytes(data)
    }
}
