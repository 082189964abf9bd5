//! Parsing and enforcement of policy decisions.

use http::StatusCode;

use crate::error::InvalidDecision;
use crate::phase::Phase;

/// Lowest status a policy may force.
pub const MIN_FAILURE_STATUS: i32 = 400;
/// Highest status a policy may force.
pub const MAX_FAILURE_STATUS: i32 = 599;

/// The parsed outcome of a single policy call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through unchanged.
    Pass,
    /// Force the response to this client or server error status.
    Fail(StatusCode),
}

impl Decision {
    /// Parses a raw policy return value.
    ///
    /// `0` means [`Decision::Pass`]; `400..=599` means [`Decision::Fail`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDecision`] for any other value.
    ///
    /// # Examples
    ///
    /// ```
    /// use resilience_core::{Decision, Phase};
    /// use http::StatusCode;
    ///
    /// assert_eq!(Decision::from_raw(0, Phase::PreDispatch), Ok(Decision::Pass));
    /// assert_eq!(
    ///     Decision::from_raw(503, Phase::PreCommit),
    ///     Ok(Decision::Fail(StatusCode::SERVICE_UNAVAILABLE)),
    /// );
    /// assert!(Decision::from_raw(200, Phase::PreDispatch).is_err());
    /// ```
    pub fn from_raw(raw: i32, phase: Phase) -> Result<Self, InvalidDecision> {
        match raw {
            0 => Ok(Decision::Pass),
            MIN_FAILURE_STATUS..=MAX_FAILURE_STATUS => StatusCode::from_u16(raw as u16)
                .map(Decision::Fail)
                .map_err(|_| InvalidDecision::new(raw, phase)),
            _ => Err(InvalidDecision::new(raw, phase)),
        }
    }

    /// Returns the raw value a policy would return for this decision.
    pub fn into_raw(self) -> i32 {
        match self {
            Decision::Pass => 0,
            Decision::Fail(status) => i32::from(status.as_u16()),
        }
    }

    /// Returns the forced status, if any.
    pub fn status(self) -> Option<StatusCode> {
        match self {
            Decision::Pass => None,
            Decision::Fail(status) => Some(status),
        }
    }
}

/// Parses a raw decision, aborting the request on a contract violation.
///
/// An out-of-range value is a bug in the caller's policy, not a request
/// failure, so it unwinds with an [`InvalidDecision`] payload rather than
/// producing a response.
pub(crate) fn enforce(raw: i32, phase: Phase) -> Option<StatusCode> {
    match Decision::from_raw(raw, phase) {
        Ok(decision) => decision.status(),
        Err(invalid) => {
            tracing::error!(phase = %phase, value = raw, "policy returned an invalid decision");
            std::panic::panic_any(invalid)
        }
    }
}
