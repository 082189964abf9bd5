//! Decision points within a single request.
//!
//! Every request passes through at most two decision points. The policy is
//! told which one it is being asked about so it can fail early, late, or both.

use std::fmt;

/// The point in request handling at which a policy is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the downstream handler runs.
    ///
    /// A failure here short-circuits the request: the downstream handler is
    /// never called and the response carries no body.
    PreDispatch,
    /// When the downstream handler first commits its status, explicitly or
    /// through its first body write.
    ///
    /// A failure here replaces the status only; the body is left to the
    /// downstream handler.
    PreCommit,
}

impl Phase {
    /// Returns `true` for [`Phase::PreCommit`].
    ///
    /// Handy for policies written against a plain "after header" flag.
    pub fn is_after_header(self) -> bool {
        matches!(self, Phase::PreCommit)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreDispatch => write!(f, "pre-dispatch"),
            Phase::PreCommit => write!(f, "pre-commit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(format!("{}", Phase::PreDispatch), "pre-dispatch");
        assert_eq!(format!("{}", Phase::PreCommit), "pre-commit");
    }

    #[test]
    fn only_pre_commit_is_after_header() {
        assert!(!Phase::PreDispatch.is_after_header());
        assert!(Phase::PreCommit.is_after_header());
    }
}
