use http::StatusCode;
use rand::Rng;

use crate::decision::{MAX_FAILURE_STATUS, MIN_FAILURE_STATUS};
use crate::error::{ConfigError, ConfigErrorKind};
use crate::phase::Phase;

/// Decides whether a request should fail at a given phase.
///
/// `decide` returns `0` to let the request through, or a status in
/// `400..=599` to force that status. Any other value is a bug in the
/// policy and aborts the request with an
/// [`InvalidDecision`](crate::InvalidDecision) panic.
///
/// For every request the policy is called once with
/// [`Phase::PreDispatch`], and, only if that returned `0`, at most once
/// more with [`Phase::PreCommit`].
///
/// # Thread safety
///
/// The injector calls `decide` from whichever thread is serving the
/// request and takes no lock around it. A policy that keeps shared state
/// (a counter, a seeded RNG) is responsible for its own synchronization.
///
/// Any `Fn(&Req, Phase) -> i32` closure is a policy.
///
/// # Examples
///
/// ```
/// use resilience_core::{DecisionPolicy, Phase};
///
/// // Fail every request late, after the handler has started.
/// let late = |_req: &(), phase: Phase| if phase.is_after_header() { 503 } else { 0 };
/// assert_eq!(late.decide(&(), Phase::PreDispatch), 0);
/// assert_eq!(late.decide(&(), Phase::PreCommit), 503);
/// ```
pub trait DecisionPolicy<Req: ?Sized> {
    /// Returns `0` or a failure status for this request at this phase.
    fn decide(&self, request: &Req, phase: Phase) -> i32;
}

impl<Req: ?Sized, F> DecisionPolicy<Req> for F
where
    F: Fn(&Req, Phase) -> i32,
{
    fn decide(&self, request: &Req, phase: Phase) -> i32 {
        (self)(request, phase)
    }
}

/// Validates a configured failure status.
fn failure_status(status: u16) -> Result<StatusCode, ConfigError> {
    let out_of_range = || {
        ConfigError::new(
            ConfigErrorKind::StatusOutOfRange,
            format!(
                "status {} not in {}..={}",
                status, MIN_FAILURE_STATUS, MAX_FAILURE_STATUS
            ),
        )
    };
    if !(MIN_FAILURE_STATUS..=MAX_FAILURE_STATUS).contains(&i32::from(status)) {
        return Err(out_of_range());
    }
    StatusCode::from_u16(status).map_err(|_| out_of_range())
}

/// A policy that never injects a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFail;

impl<Req: ?Sized> DecisionPolicy<Req> for NeverFail {
    fn decide(&self, _request: &Req, _phase: Phase) -> i32 {
        0
    }
}

/// A policy that fails every call with a fixed status.
///
/// Unscoped, this fails every request before dispatch. Wrap it in
/// [`PhaseScoped`] to fail only after the handler has started.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysFail {
    status: StatusCode,
}

impl AlwaysFail {
    /// Creates a policy that always returns `status`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` with kind `StatusOutOfRange` if `status` is not
    /// in `400..=599`.
    pub fn new(status: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            status: failure_status(status)?,
        })
    }

    /// Returns the status this policy forces.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<Req: ?Sized> DecisionPolicy<Req> for AlwaysFail {
    fn decide(&self, _request: &Req, _phase: Phase) -> i32 {
        i32::from(self.status.as_u16())
    }
}

/// A policy that fails each call independently with a fixed probability.
///
/// Randomness comes from the calling thread's RNG, so the policy holds no
/// shared state and is safe to use from concurrent requests.
///
/// Note that an unscoped `RandomFailure` is consulted at both phases, so the
/// overall per-request failure rate is `1 - (1 - rate)^2` for handlers that
/// commit a status. Use [`PhaseScoped`] to target one phase.
///
/// # Examples
///
/// ```
/// use resilience_core::RandomFailure;
///
/// let flaky = RandomFailure::new(0.1, 503).expect("valid configuration");
/// assert_eq!(flaky.rate(), 0.1);
///
/// assert!(RandomFailure::new(1.5, 503).is_err());
/// assert!(RandomFailure::new(0.1, 302).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RandomFailure {
    rate: f64,
    status: StatusCode,
}

impl RandomFailure {
    /// Creates a policy failing with `status` on a `rate` fraction of calls.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `rate` is not in `[0, 1]` or `status` is not
    /// in `400..=599`.
    pub fn new(rate: f64, status: u16) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::new(
                ConfigErrorKind::RateOutOfRange,
                format!("rate {} not in [0, 1]", rate),
            ));
        }
        Ok(Self {
            rate,
            status: failure_status(status)?,
        })
    }

    /// Returns the configured failure probability.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the status this policy forces.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<Req: ?Sized> DecisionPolicy<Req> for RandomFailure {
    fn decide(&self, _request: &Req, _phase: Phase) -> i32 {
        if rand::rng().random_bool(self.rate) {
            i32::from(self.status.as_u16())
        } else {
            0
        }
    }
}

/// Restricts a policy to a single phase.
///
/// The inner policy is not called at all for the other phase.
///
/// # Examples
///
/// ```
/// use resilience_core::{AlwaysFail, DecisionPolicy, Phase, PhaseScoped};
///
/// let late = PhaseScoped::new(AlwaysFail::new(500).unwrap(), Phase::PreCommit);
/// assert_eq!(late.decide(&(), Phase::PreDispatch), 0);
/// assert_eq!(late.decide(&(), Phase::PreCommit), 500);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PhaseScoped<P> {
    inner: P,
    phase: Phase,
}

impl<P> PhaseScoped<P> {
    /// Wraps `inner` so it is only consulted at `phase`.
    pub fn new(inner: P, phase: Phase) -> Self {
        Self { inner, phase }
    }

    /// Returns the phase the inner policy is consulted at.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Unwraps the inner policy.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<Req: ?Sized, P: DecisionPolicy<Req>> DecisionPolicy<Req> for PhaseScoped<P> {
    fn decide(&self, request: &Req, phase: Phase) -> i32 {
        if phase == self.phase {
            self.inner.decide(request, phase)
        } else {
            0
        }
    }
}
